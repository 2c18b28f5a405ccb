pub mod check;
pub mod eval;
pub mod fmt;
pub mod limit;
pub mod merge;
pub mod narrow;

use std::path::Path;

use anyhow::Context as _;
use ccl_core::{CclError, Document};
use serde::Serialize;

/// Read and parse a covenant file. Syntax errors are reported as
/// `file:line:column: message`.
pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    parse_source(path, &read_source(path)?)
}

pub fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse source already read from `path`; `path` only labels errors.
pub fn parse_source(path: &Path, source: &str) -> anyhow::Result<Document> {
    let doc = ccl_core::parse(source).map_err(|err| located(path, &err))?;
    tracing::debug!(file = %path.display(), statements = doc.len(), "parsed covenant");
    Ok(doc)
}

fn located(path: &Path, err: &CclError) -> anyhow::Error {
    match (err.line(), err.column()) {
        (Some(line), Some(column)) => {
            anyhow::anyhow!("{}:{}:{}: {}", path.display(), line, column, err.message())
        }
        _ => anyhow::anyhow!("{}: {}", path.display(), err),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
