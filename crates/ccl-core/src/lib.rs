//! # ccl-core
//!
//! The Covenant Constraint Language (CCL) engine.
//!
//! A CCL document is a list of statements describing what one party may do
//! to another party's resources:
//!
//! ```text
//! permit file.read on '/data/**' when user.role = 'analyst'
//! deny   file.delete on '/data/**' severity critical
//! require audit.log on '**'
//! limit  api.call 100 per 60 seconds
//! ```
//!
//! [`parse`] turns source text into a [`Document`]; everything else operates
//! on that value and never fails:
//!
//! - [`evaluate`] decides whether an `(action, resource, context)` request is
//!   permitted, and by which rule
//! - [`check_rate_limit`] applies `limit` statements to caller-held counters
//! - [`merge`] layers a child document over a parent
//! - [`validate_narrowing`] proves a child grants no more than its parent
//! - [`serialize`] renders a document back to CCL
//!
//! ## Key invariants
//!
//! - **Default deny**: no matching permit or deny → not permitted.
//! - **Deny wins ties**: the most specific matching rule decides; at equal
//!   specificity a deny beats a permit.
//! - **Missing data denies**: a condition over an absent context field is false.
//! - **Pure**: no operation mutates its inputs or holds state between calls.
//!
//! ```rust
//! use ccl_core::{evaluate, parse, Context};
//!
//! let doc = parse("permit file.read on '/data/**'\ndeny file.read on '/data/secret'").unwrap();
//! assert!(evaluate(&doc, "file.read", "/data/public", &Context::new()).permitted);
//! assert!(!evaluate(&doc, "file.read", "/data/secret", &Context::new()).permitted);
//! ```

pub mod ast;
pub mod condition;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod merge;
pub mod narrowing;
pub mod parser;
pub mod rate_limit;
pub mod serializer;
pub mod token;

use std::str::FromStr;

pub use ast::{Comparison, Condition, Document, Limit, Operator, Rule, Severity, Statement, Value};
pub use condition::{evaluate_condition, Context};
pub use engine::{
    evaluate, evaluate_with_trace, EvaluationResult, EvaluationStep, EvaluationTrace, StepOutcome,
};
pub use error::CclError;
pub use lexer::tokenize;
pub use matcher::{match_action, match_resource, rule_covers, rules_overlap, specificity};
pub use merge::merge;
pub use narrowing::{validate_narrowing, NarrowingResult, NarrowingViolation};
pub use parser::parse_tokens;
pub use rate_limit::{check_rate_limit, RateLimitResult, Remaining};
pub use serializer::serialize;
pub use token::{Token, TokenKind};

/// Parse CCL source text into a [`Document`].
///
/// Whitespace-only input is rejected up front rather than surfacing as an
/// unexpected end of input.
pub fn parse(source: &str) -> Result<Document, CclError> {
    if source.trim().is_empty() {
        return Err(CclError::syntax(1, 1, "CCL source is empty"));
    }
    let tokens = tokenize(source)?;
    parse_tokens(&tokens)
}

impl FromStr for Document {
    type Err = CclError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse(source)
    }
}
