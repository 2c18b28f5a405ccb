//! # ccl-cli
//!
//! Command-line tools for Covenant Constraint Language files.
//!
//! - `ccl check` — parse a covenant and report syntax errors with positions
//! - `ccl fmt` — print (or rewrite) a covenant in canonical form
//! - `ccl eval` — decide a single action/resource request
//! - `ccl limit` — check a caller-held counter against `limit` statements
//! - `ccl merge` — layer a child covenant over a parent
//! - `ccl narrow` — verify a child covenant only narrows its parent

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, OutputFormat, DEFAULT_CONFIG_PATH};

/// CCL covenant tools.
#[derive(Parser)]
#[command(name = "ccl", version, about)]
struct Cli {
    /// Config file (defaults to .ccl/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format; overrides `[output] format` from the config file.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a covenant and report its statements.
    Check(commands::check::CheckArgs),
    /// Print a covenant in canonical form.
    Fmt(commands::fmt::FmtArgs),
    /// Evaluate a request against a covenant.
    Eval(commands::eval::EvalArgs),
    /// Check a usage counter against the covenant's limits.
    Limit(commands::limit::LimitArgs),
    /// Merge a child covenant into a parent.
    Merge(commands::merge::MergeArgs),
    /// Verify that a child covenant only narrows its parent.
    Narrow(commands::narrow::NarrowArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = CliConfig::load_or_default(&config_path)?;
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    // Logs go to stderr so stdout stays clean for covenant text and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log.filter))?,
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!(config = %config_path.display(), "loaded CLI configuration");

    match &cli.command {
        Commands::Check(args) => commands::check::execute(args, &config),
        Commands::Fmt(args) => commands::fmt::execute(args, &config),
        Commands::Eval(args) => commands::eval::execute(args, &config),
        Commands::Limit(args) => commands::limit::execute(args, &config),
        Commands::Merge(args) => commands::merge::execute(args, &config),
        Commands::Narrow(args) => commands::narrow::execute(args, &config),
    }
}
