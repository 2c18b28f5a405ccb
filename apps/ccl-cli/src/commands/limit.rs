// limit.rs — `ccl limit`: check a usage counter against `limit` statements.

use std::path::PathBuf;

use ccl_core::check_rate_limit;
use clap::Args;

use crate::commands::{load_document, print_json};
use crate::config::{CliConfig, OutputFormat};

#[derive(Args)]
pub struct LimitArgs {
    /// Covenant file.
    pub file: PathBuf,

    /// Action being counted.
    #[arg(long)]
    pub action: String,

    /// Calls already made in the current period.
    #[arg(long)]
    pub used: u64,

    /// Start of the current period, in milliseconds since the Unix epoch.
    #[arg(long)]
    pub period_start: i64,

    /// Current time in epoch milliseconds (defaults to the wall clock).
    #[arg(long)]
    pub now: Option<i64>,
}

pub fn execute(args: &LimitArgs, config: &CliConfig) -> anyhow::Result<()> {
    let doc = load_document(&args.file)?;
    let now = args
        .now
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let result = check_rate_limit(&doc, &args.action, args.used, args.period_start, now);

    match config.output.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => {
            println!("{}", if result.exceeded { "EXCEEDED" } else { "OK" });
            println!("  remaining: {}", result.remaining);
            match &result.matched_limit {
                Some(limit) => println!("  limit:     line {}: {}", limit.line, limit_text(limit)),
                None => println!("  limit:     none applies to '{}'", args.action),
            }
        }
    }
    Ok(())
}

fn limit_text(limit: &ccl_core::Limit) -> String {
    ccl_core::Statement::Limit(limit.clone()).to_string()
}
