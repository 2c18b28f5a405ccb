// fmt.rs — `ccl fmt`: canonical rendering of a covenant.
//
// The canonical form has no comments, so `--write` refuses files that
// carry any rather than deleting them.

use std::path::PathBuf;

use anyhow::Context as _;
use ccl_core::TokenKind;
use clap::Args;

use crate::commands::{parse_source, print_json, read_source};
use crate::config::{CliConfig, OutputFormat};

#[derive(Args)]
pub struct FmtArgs {
    /// Covenant file to format.
    pub file: PathBuf,

    /// Rewrite the file in place instead of printing.
    #[arg(long)]
    pub write: bool,
}

pub fn execute(args: &FmtArgs, config: &CliConfig) -> anyhow::Result<()> {
    let source = read_source(&args.file)?;
    let doc = parse_source(&args.file, &source)?;
    let formatted = ccl_core::serialize(&doc);
    let comments = count_comments(&source);

    if args.write {
        if comments > 0 {
            anyhow::bail!(
                "{} has {} comment(s) that formatting would drop; not rewriting it",
                args.file.display(),
                comments
            );
        }
        std::fs::write(&args.file, &formatted)
            .with_context(|| format!("failed to write {}", args.file.display()))?;
        tracing::info!(file = %args.file.display(), "formatted covenant");
        return Ok(());
    }

    if comments > 0 {
        tracing::warn!(file = %args.file.display(), comments, "comments are not part of the canonical form");
    }
    match config.output.format {
        OutputFormat::Json => print_json(&doc)?,
        OutputFormat::Text => print!("{}", formatted),
    }
    Ok(())
}

/// Source that parsed cleanly always tokenizes, so a failure counts as none.
fn count_comments(source: &str) -> usize {
    ccl_core::tokenize(source)
        .map(|tokens| tokens.iter().filter(|t| t.kind == TokenKind::Comment).count())
        .unwrap_or(0)
}
