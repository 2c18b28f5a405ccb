// check.rs — `ccl check`: parse a covenant and summarize it.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::commands::{load_document, print_json};
use crate::config::{CliConfig, OutputFormat};

#[derive(Args)]
pub struct CheckArgs {
    /// Covenant file to check.
    pub file: PathBuf,
}

#[derive(Debug, PartialEq, Serialize)]
struct Summary {
    statements: usize,
    permits: usize,
    denies: usize,
    obligations: usize,
    limits: usize,
}

pub fn execute(args: &CheckArgs, config: &CliConfig) -> anyhow::Result<()> {
    let doc = load_document(&args.file)?;
    let summary = Summary {
        statements: doc.len(),
        permits: doc.permits().count(),
        denies: doc.denies().count(),
        obligations: doc.obligations().count(),
        limits: doc.limits().count(),
    };

    match config.output.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!("{}: ok, {} statement(s)", args.file.display(), summary.statements);
            println!("  permit   {}", summary.permits);
            println!("  deny     {}", summary.denies);
            println!("  require  {}", summary.obligations);
            println!("  limit    {}", summary.limits);
        }
    }
    Ok(())
}
