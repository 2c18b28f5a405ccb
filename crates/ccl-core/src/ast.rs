// ast.rs — The parsed form of a CCL document.
//
// A `Document` owns its statements in source order. The permit / deny /
// obligation / limit views are computed on demand from that list, so they
// always partition it exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a violation of a statement is. Defaults to `High`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    #[default]
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators usable in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Contains,
    NotContains,
    In,
    NotIn,
    Matches,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub fn parse(text: &str) -> Option<Self> {
        let op = match text {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::LtEq,
            ">=" => Operator::GtEq,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "matches" => Operator::Matches,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Matches => "matches",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
        }
    }

    /// `in` and `not_in` take a list literal; every other operator a scalar.
    pub fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

/// A leaf condition: `field operator value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Dotted path into the evaluation context (e.g. `user.role`).
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// A condition tree. `Not` holds exactly one child by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Compare(Comparison),
    And { children: Vec<Condition> },
    Or { children: Vec<Condition> },
    Not { child: Box<Condition> },
}

impl Condition {
    pub fn compare(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Condition::Compare(Comparison {
            field: field.into(),
            operator,
            value,
        })
    }

    pub fn negate(child: Condition) -> Self {
        Condition::Not {
            child: Box::new(child),
        }
    }
}

/// Shared shape of permit, deny, and require statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub severity: Severity,
    /// Line the statement started on; 0 for synthesized rules.
    #[serde(default)]
    pub line: usize,
}

/// `limit <action> <count> per <period_seconds> seconds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub action: String,
    pub count: u32,
    pub period_seconds: u32,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub line: usize,
}

/// One CCL statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    Permit(Rule),
    Deny(Rule),
    /// An obligation. Never affects whether an action is permitted.
    Require(Rule),
    Limit(Limit),
}

impl Statement {
    /// Keyword the statement starts with.
    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::Permit(_) => "permit",
            Statement::Deny(_) => "deny",
            Statement::Require(_) => "require",
            Statement::Limit(_) => "limit",
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Statement::Permit(r) | Statement::Deny(r) | Statement::Require(r) => &r.action,
            Statement::Limit(l) => &l.action,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Statement::Permit(r) | Statement::Deny(r) | Statement::Require(r) => r.severity,
            Statement::Limit(l) => l.severity,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Statement::Permit(r) | Statement::Deny(r) | Statement::Require(r) => r.line,
            Statement::Limit(l) => l.line,
        }
    }

    /// The rule body for permit / deny / require statements.
    pub fn rule(&self) -> Option<&Rule> {
        match self {
            Statement::Permit(r) | Statement::Deny(r) | Statement::Require(r) => Some(r),
            Statement::Limit(_) => None,
        }
    }

    pub fn is_permit(&self) -> bool {
        matches!(self, Statement::Permit(_))
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Statement::Deny(_))
    }
}

/// A parsed CCL policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    statements: Vec<Statement>,
}

impl Document {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// All statements in source order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn permits(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.statements.iter().filter_map(|s| match s {
            Statement::Permit(r) => Some(r),
            _ => None,
        })
    }

    pub fn denies(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.statements.iter().filter_map(|s| match s {
            Statement::Deny(r) => Some(r),
            _ => None,
        })
    }

    pub fn obligations(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.statements.iter().filter_map(|s| match s {
            Statement::Require(r) => Some(r),
            _ => None,
        })
    }

    pub fn limits(&self) -> impl Iterator<Item = &Limit> + '_ {
        self.statements.iter().filter_map(|s| match s {
            Statement::Limit(l) => Some(l),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
