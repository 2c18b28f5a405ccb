// narrow.rs — `ccl narrow`: verify a child covenant only narrows its parent.

use std::path::PathBuf;

use clap::Args;

use crate::commands::{load_document, print_json};
use crate::config::{CliConfig, OutputFormat};

#[derive(Args)]
pub struct NarrowArgs {
    /// Parent covenant.
    pub parent: PathBuf,

    /// Child covenant that must not grant more than the parent.
    pub child: PathBuf,
}

pub fn execute(args: &NarrowArgs, config: &CliConfig) -> anyhow::Result<()> {
    let parent = load_document(&args.parent)?;
    let child = load_document(&args.child)?;
    let result = ccl_core::validate_narrowing(&parent, &child);

    match config.output.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => {
            if result.valid {
                println!(
                    "{} narrows {}: no violations.",
                    args.child.display(),
                    args.parent.display()
                );
            } else {
                println!("{} violation(s):", result.violations.len());
                for violation in &result.violations {
                    println!("  {}", violation.reason);
                }
            }
        }
    }

    if !result.valid {
        anyhow::bail!(
            "{} grants more than {}",
            args.child.display(),
            args.parent.display()
        );
    }
    Ok(())
}
