use super::{read_input, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use paramlift_engine::Splitter;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct SplitArgs {
    #[arg(short, long, conflicts_with = "stdin")]
    input: Option<PathBuf>,

    #[arg(long, conflicts_with = "input")]
    stdin: bool,

    /// Write each unit to <out-dir>/<unit_name>.py instead of printing JSON
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "json-pretty")]
    format: OutputFormat,

    #[arg(short, long)]
    verbose: bool,
}

pub fn execute(args: SplitArgs) -> Result<()> {
    let source = read_input(&args.input, args.stdin)?;

    let outcome = Splitter::default().split(&source).context("Split failed")?;

    for warning in &outcome.warnings {
        eprintln!("{} {}", "⚠️ ".yellow(), warning);
    }

    if let Some(out_dir) = &args.out_dir {
        fs::create_dir_all(out_dir)?;
        for unit in &outcome.units {
            let path = out_dir.join(format!("{}.py", unit.unit_name));
            fs::write(&path, &unit.code)?;
            if args.verbose {
                println!(
                    "  {} {} ({} bindings)",
                    "✅".green(),
                    path.display(),
                    unit.bindings.len()
                );
            }
        }
        println!(
            "📊 {} unit{} written to {}",
            outcome.units.len(),
            if outcome.units.len() == 1 { "" } else { "s" },
            out_dir.display()
        );
        return Ok(());
    }

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string(&outcome.units)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&outcome.units)?,
        OutputFormat::Text => {
            let mut out = String::new();
            for unit in &outcome.units {
                out.push_str(&format!(
                    "{} {} ({} bindings, {} lines)\n",
                    "unit:".bold(),
                    unit.unit_name.cyan(),
                    unit.bindings.len(),
                    unit.code.lines().count()
                ));
            }
            out
        }
    };
    println!("{}", rendered);

    Ok(())
}
