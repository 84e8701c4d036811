//! CLI tool for converting PowerPoint presentations into Word documents.

use anyhow::Result;
use clap::Parser;
use slidedoc_cli::{run_batch, BatchConfig, BatchError, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use std::io::Write;
use std::path::PathBuf;

/// Convert every .pptx file in a folder into a .docx document.
#[derive(Parser, Debug)]
#[command(name = "pptx2docx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing the .pptx files
    #[arg(default_value = DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Folder receiving the .docx files (created if missing)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = BatchConfig::new(args.input, args.output);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match run_batch(&config, &mut out) {
        Ok(report) => {
            if args.verbose {
                eprintln!(
                    "{} converted, {} failed",
                    report.converted(),
                    report.failed()
                );
            }
        }
        Err(e @ BatchError::InputNotADirectory(_)) => {
            writeln!(out, "Error: {}", e)?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
