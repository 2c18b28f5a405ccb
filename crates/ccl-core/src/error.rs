// error.rs — Error types for the CCL engine.
//
// Only two failure kinds exist. Syntax errors come out of the lexer and
// parser and always carry the 1-based position of the offending token.
// Validation errors are reserved for callers that want to turn a result
// object (e.g. a narrowing check) into a `Result`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the CCL engine.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CclError {
    /// The source text is not valid CCL.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A well-formed document failed a semantic check.
    #[error("validation error: {message}")]
    Validation { message: String },
}

impl CclError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        CclError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Stable name of the error kind, for callers that surface it verbatim.
    pub fn kind(&self) -> &'static str {
        match self {
            CclError::Syntax { .. } => "SyntaxError",
            CclError::Validation { .. } => "ValidationError",
        }
    }

    /// The human-readable message without position prefix.
    pub fn message(&self) -> &str {
        match self {
            CclError::Syntax { message, .. } | CclError::Validation { message } => message,
        }
    }

    /// 1-based line of a syntax error.
    pub fn line(&self) -> Option<usize> {
        match self {
            CclError::Syntax { line, .. } => Some(*line),
            CclError::Validation { .. } => None,
        }
    }

    /// 1-based column of a syntax error.
    pub fn column(&self) -> Option<usize> {
        match self {
            CclError::Syntax { column, .. } => Some(*column),
            CclError::Validation { .. } => None,
        }
    }
}
