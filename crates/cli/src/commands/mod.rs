use anyhow::{Context, Result};
use clap::ValueEnum;
use std::io::{Read, Write};
use std::path::PathBuf;

pub mod extract;
pub mod pipeline;
pub mod split;
pub mod transform;

#[derive(ValueEnum, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Text,
}

pub fn read_input(input: &Option<PathBuf>, stdin: bool) -> Result<String> {
    if stdin {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = input {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))
    } else {
        anyhow::bail!("No input source specified (use --input or --stdin)")
    }
}

pub fn write_output(output: &Option<PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write to file: {}", path.display()))?;
    } else {
        std::io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
