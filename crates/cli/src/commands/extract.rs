use super::{read_input, write_output, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use paramlift_engine::StructuralExtractor;
use std::path::PathBuf;

#[derive(Args)]
pub struct ExtractArgs {
    #[arg(short, long, conflicts_with = "stdin")]
    input: Option<PathBuf>,

    #[arg(long, conflicts_with = "input")]
    stdin: bool,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "json-pretty")]
    format: OutputFormat,

    /// Identifier of the runtime configuration mapping
    #[arg(long, default_value = "params")]
    mapping: String,
}

pub fn execute(args: ExtractArgs) -> Result<()> {
    let source = read_input(&args.input, args.stdin)?;

    let signature = StructuralExtractor::with_mapping_ident(&args.mapping)
        .extract(&source)
        .context("Extraction failed")?;

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string(&signature)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&signature)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!(
                "{} {} ({} bindings)\n",
                "kind:".bold(),
                signature.kind,
                signature.len()
            ));
            for (name, binding) in &signature.bindings {
                out.push_str(&format!(
                    "  {} = {}  [{:?}, confidence {:.2}]\n",
                    name.cyan(),
                    binding.value.canonical(),
                    binding.origin,
                    binding.confidence
                ));
            }
            out.push_str(&format!("{} {}\n", "hash:".bold(), signature.content_hash));
            out
        }
    };

    write_output(&args.output, &rendered)
}
