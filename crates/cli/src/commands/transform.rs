use super::{read_input, write_output};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use paramlift_engine::{Externalizer, StructuralExtractor, Verifier};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args)]
pub struct TransformArgs {
    #[arg(short, long, conflicts_with_all = &["stdin", "dir"])]
    input: Option<PathBuf>,

    #[arg(long, conflicts_with_all = &["input", "dir"])]
    stdin: bool,

    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Transform every .py file under a directory
    #[arg(short = 'd', long, conflicts_with_all = &["input", "stdin"])]
    dir: Option<PathBuf>,

    #[arg(long, requires = "dir")]
    out_dir: Option<PathBuf>,

    /// Write a JSON report (signature + verification) next to the output
    #[arg(long)]
    report: bool,

    #[arg(long, default_value = "params")]
    mapping: String,

    #[arg(short, long)]
    verbose: bool,
}

pub fn execute(args: TransformArgs) -> Result<()> {
    if args.dir.is_some() {
        return execute_batch(&args);
    }

    let source = read_input(&args.input, args.stdin)?;
    if source.trim().is_empty() {
        anyhow::bail!("Input is empty");
    }

    let (transformed, report) = transform_one(&source, &args.mapping)?;

    write_output(&args.output, &transformed)?;

    if args.report {
        let report_path = args
            .output
            .as_ref()
            .map(|p| p.with_extension("report.json"))
            .unwrap_or_else(|| PathBuf::from("paramlift.report.json"));
        fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
        if args.verbose {
            println!("📄 Report written to: {}", report_path.display());
        }
    }

    if !report.verified {
        eprintln!(
            "{} transform is unverified:",
            "⚠️  warning:".yellow().bold()
        );
        for difference in &report.differences {
            eprintln!("   - {}", difference);
        }
    } else if args.verbose {
        println!(
            "{} signature re-derived intact ({} bindings)",
            "✅ verified:".green().bold(),
            report.original_signature.len()
        );
    }

    Ok(())
}

fn transform_one(
    source: &str,
    mapping: &str,
) -> Result<(String, paramlift_engine::VerificationReport)> {
    let extractor = StructuralExtractor::with_mapping_ident(mapping);
    let signature = extractor.extract(source).context("Extraction failed")?;
    let result = Externalizer::with_mapping_ident(mapping).transform(source, &signature);
    for warning in &result.warnings {
        eprintln!("{} {}", "⚠️ ".yellow(), warning);
    }
    let report = Verifier::new(extractor).verify(source, &result.transformed_source);
    Ok((result.transformed_source, report))
}

fn execute_batch(args: &TransformArgs) -> Result<()> {
    let Some(dir) = args.dir.as_ref() else {
        anyhow::bail!("No input directory specified");
    };
    if !dir.is_dir() {
        anyhow::bail!("Input path is not a directory: {}", dir.display());
    }
    let out_dir = args
        .out_dir
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--out-dir is required when using --dir"))?;
    fs::create_dir_all(out_dir)?;

    let pattern = dir.join("**/*.py");
    let files: Vec<PathBuf> = glob::glob(pattern.to_str().unwrap())?
        .filter_map(Result::ok)
        .collect();

    if files.is_empty() {
        anyhow::bail!("No .py files found in directory: {}", dir.display());
    }

    if args.verbose {
        println!("📁 Processing {} scanner files", files.len());
    }

    let start = Instant::now();
    let mut success_count = 0usize;
    let mut unverified_count = 0usize;
    let mut error_count = 0usize;
    let mut errors = Vec::new();

    for file_path in files {
        let relative = file_path.strip_prefix(dir).unwrap_or(&file_path);
        let output_path = out_dir.join(relative);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let source = match fs::read_to_string(&file_path) {
            Ok(s) => s,
            Err(e) => {
                error_count += 1;
                errors.push(format!("{}: {}", file_path.display(), e));
                continue;
            }
        };

        match transform_one(&source, &args.mapping) {
            Ok((transformed, report)) => {
                if let Err(e) = fs::write(&output_path, transformed) {
                    error_count += 1;
                    errors.push(format!("{}: {}", output_path.display(), e));
                    continue;
                }
                if report.verified {
                    success_count += 1;
                    if args.verbose {
                        println!("  {} {}", "✅".green(), relative.display());
                    }
                } else {
                    unverified_count += 1;
                    if args.verbose {
                        println!("  {} {} (unverified)", "⚠️".yellow(), relative.display());
                    }
                }
            }
            Err(e) => {
                error_count += 1;
                errors.push(format!("{}: {}", file_path.display(), e));
                if args.verbose {
                    println!("  {} {}: {}", "❌".red(), relative.display(), e);
                }
            }
        }
    }

    println!("\n📊 Batch complete in {:.2}s:", start.elapsed().as_secs_f64());
    println!("   Verified: {} files", success_count);
    if unverified_count > 0 {
        println!("   Unverified: {} files", unverified_count);
    }
    if error_count > 0 {
        println!("   Failed: {} files", error_count);
        for (i, error) in errors.iter().take(10).enumerate() {
            println!("   {}. {}", i + 1, error);
        }
        if errors.len() > 10 {
            println!("   ... and {} more errors", errors.len() - 10);
        }
    }

    Ok(())
}
