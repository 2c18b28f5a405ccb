// merge.rs — `ccl merge`: layer a child covenant over a parent.

use std::path::PathBuf;

use clap::Args;

use crate::commands::{load_document, print_json};
use crate::config::{CliConfig, OutputFormat};

#[derive(Args)]
pub struct MergeArgs {
    /// Parent covenant.
    pub parent: PathBuf,

    /// Child covenant layered on top.
    pub child: PathBuf,
}

pub fn execute(args: &MergeArgs, config: &CliConfig) -> anyhow::Result<()> {
    let parent = load_document(&args.parent)?;
    let child = load_document(&args.child)?;
    let merged = ccl_core::merge(&parent, &child);

    match config.output.format {
        OutputFormat::Json => print_json(&merged)?,
        OutputFormat::Text => print!("{}", merged),
    }
    Ok(())
}
