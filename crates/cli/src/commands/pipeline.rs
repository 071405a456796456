use super::{read_input, write_output, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use paramlift_engine::{EngineConfig, OpenAIProvider, PipelineRunner, PipelineState};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct PipelineArgs {
    #[arg(short, long, conflicts_with = "stdin")]
    input: Option<PathBuf>,

    #[arg(long, conflicts_with = "input")]
    stdin: bool,

    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Engine configuration file (YAML); defaults come from the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable the enrichment pass (needs OPENAI_API_KEY or config api_key)
    #[arg(long)]
    enrich: bool,

    #[arg(short = 'f', long, value_enum, default_value = "json-pretty")]
    format: OutputFormat,

    #[arg(short, long)]
    verbose: bool,
}

pub async fn execute(args: PipelineArgs) -> Result<()> {
    let source = read_input(&args.input, args.stdin)?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::from_env(),
    };
    if args.enrich {
        config.enrichment.enabled = true;
    }

    let mut runner = PipelineRunner::new(config.clone());
    if config.enrichment.enabled {
        match build_provider(&config) {
            Ok(provider) => runner = runner.with_provider(provider),
            Err(e) => eprintln!(
                "{} enrichment disabled: {}",
                "⚠️ ".yellow(),
                e
            ),
        }
    }

    let outcome = runner.run(&source).await.context("Pipeline failed")?;

    for warning in &outcome.warnings {
        eprintln!("{} {}", "⚠️ ".yellow(), warning);
    }

    if args.verbose {
        let badge = match outcome.state {
            PipelineState::Verified => "✅ VERIFIED".green().bold(),
            _ => "⚠️  UNVERIFIED".yellow().bold(),
        };
        println!(
            "{} — {} unit{}",
            badge,
            outcome.units.len(),
            if outcome.units.len() == 1 { "" } else { "s" }
        );
    }

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string(&outcome)?,
        _ => serde_json::to_string_pretty(&outcome)?,
    };
    write_output(&args.output, &rendered)
}

fn build_provider(config: &EngineConfig) -> Result<Arc<OpenAIProvider>> {
    let provider = match &config.enrichment.api_key {
        Some(api_key) => OpenAIProvider::with_config(
            api_key.clone(),
            config.enrichment.model.clone(),
            0.2,
            1500,
        ),
        None => OpenAIProvider::new(Some(config.enrichment.model.clone()))
            .map_err(|e| anyhow::anyhow!("{}", e))?,
    };
    Ok(Arc::new(provider))
}
