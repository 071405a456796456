use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{
    extract::ExtractArgs, pipeline::PipelineArgs, split::SplitArgs, transform::TransformArgs,
};

#[derive(Parser)]
#[command(name = "paramlift")]
#[command(about = "Parameter-integrity transformation for scanner scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the parameter signature of a scanner source
    Extract(ExtractArgs),

    /// Rewrite literal thresholds into configurable lookups
    Transform(TransformArgs),

    /// Split a multi-pattern source into standalone units
    Split(SplitArgs),

    /// Run the full extract-split-transform-verify pipeline
    Pipeline(PipelineArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => commands::extract::execute(args),
        Commands::Transform(args) => commands::transform::execute(args),
        Commands::Split(args) => commands::split::execute(args),
        Commands::Pipeline(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::pipeline::execute(args))
        }
    }
}
