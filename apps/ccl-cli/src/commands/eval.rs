// eval.rs — `ccl eval`: decide one request against a covenant.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use ccl_core::{evaluate, evaluate_with_trace, Context, EvaluationResult, StepOutcome};
use clap::Args;

use crate::commands::{load_document, print_json};
use crate::config::{CliConfig, OutputFormat};

#[derive(Args)]
pub struct EvalArgs {
    /// Covenant file.
    pub file: PathBuf,

    /// Action being attempted (e.g. file.read).
    #[arg(long)]
    pub action: String,

    /// Resource the action targets (e.g. /data/reports).
    #[arg(long, default_value = "")]
    pub resource: String,

    /// JSON object supplying condition fields (defaults to `[evaluate] context`).
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Show how every rule fared.
    #[arg(long)]
    pub trace: bool,
}

pub fn execute(args: &EvalArgs, config: &CliConfig) -> anyhow::Result<()> {
    let doc = load_document(&args.file)?;
    let context = match args.context.as_ref().or(config.evaluate.context.as_ref()) {
        Some(path) => load_context(path)?,
        None => Context::new(),
    };

    if args.trace {
        let trace = evaluate_with_trace(&doc, &args.action, &args.resource, &context);
        match config.output.format {
            OutputFormat::Json => print_json(&trace)?,
            OutputFormat::Text => {
                print_result(&trace.result);
                println!();
                for (index, step) in trace.steps.iter().enumerate() {
                    let marker = if trace.winner == Some(index) { "*" } else { " " };
                    println!(
                        "{} line {:<4} {:<17} specificity {:<3} {}",
                        marker,
                        step.line,
                        outcome_label(step.outcome),
                        step.specificity,
                        step.statement
                    );
                }
            }
        }
        return Ok(());
    }

    let result = evaluate(&doc, &args.action, &args.resource, &context);
    match config.output.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => print_result(&result),
    }
    Ok(())
}

fn print_result(result: &EvaluationResult) {
    println!("{}", if result.permitted { "PERMIT" } else { "DENY" });
    println!("  reason:   {}", result.reason);
    if let Some(severity) = result.severity {
        println!("  severity: {}", severity);
    }
    if !result.all_matches.is_empty() {
        println!("  matches:");
        for statement in &result.all_matches {
            println!("    line {}: {}", statement.line(), statement);
        }
    }
}

fn outcome_label(outcome: StepOutcome) -> &'static str {
    match outcome {
        StepOutcome::Matched => "matched",
        StepOutcome::ActionMismatch => "action mismatch",
        StepOutcome::ResourceMismatch => "resource mismatch",
        StepOutcome::ConditionFalse => "condition false",
    }
}

/// Load a JSON context file. The top level must be an object.
fn load_context(path: &Path) -> anyhow::Result<Context> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read context {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in context {}", path.display()))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!(
            "context {} must be a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
