// condition.rs — Evaluates condition trees against a request context.
//
// The context is a JSON object. Fields are dotted paths into it
// (`user.profile.level`). A comparison whose field cannot be resolved is
// false, whatever the operator: missing data never grants anything.
// Evaluation never fails; type mismatches also yield false.

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::ast::{Comparison, Condition, Operator, Value};

/// Request metadata that conditions are evaluated against.
pub type Context = serde_json::Map<String, JsonValue>;

/// Evaluate a condition tree against a context.
pub fn evaluate_condition(condition: &Condition, context: &Context) -> bool {
    match condition {
        Condition::Compare(cmp) => evaluate_comparison(cmp, context),
        Condition::And { children } => children.iter().all(|c| evaluate_condition(c, context)),
        Condition::Or { children } => children.iter().any(|c| evaluate_condition(c, context)),
        Condition::Not { child } => !evaluate_condition(child, context),
    }
}

/// Resolve a dotted field path in the context.
pub fn lookup<'a>(context: &'a Context, field: &str) -> Option<&'a JsonValue> {
    let mut parts = field.split('.');
    let mut current = context.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn evaluate_comparison(cmp: &Comparison, context: &Context) -> bool {
    let Some(actual) = lookup(context, &cmp.field) else {
        return false;
    };

    match cmp.operator {
        Operator::Eq => values_equal(actual, &cmp.value),
        Operator::NotEq => !values_equal(actual, &cmp.value),
        Operator::Lt => compare_numbers(actual, &cmp.value, |a, b| a < b),
        Operator::Gt => compare_numbers(actual, &cmp.value, |a, b| a > b),
        Operator::LtEq => compare_numbers(actual, &cmp.value, |a, b| a <= b),
        Operator::GtEq => compare_numbers(actual, &cmp.value, |a, b| a >= b),
        Operator::Contains => contains(actual, &cmp.value).unwrap_or(false),
        Operator::NotContains => contains(actual, &cmp.value).map(|c| !c).unwrap_or(false),
        Operator::In => member_of(actual, &cmp.value).unwrap_or(false),
        Operator::NotIn => member_of(actual, &cmp.value).map(|m| !m).unwrap_or(false),
        Operator::Matches => match (actual, &cmp.value) {
            (JsonValue::String(s), Value::String(pattern)) => match Regex::new(pattern) {
                Ok(re) => re.is_match(s),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "invalid regex in condition; treating as no match");
                    false
                }
            },
            _ => false,
        },
        Operator::StartsWith => match (actual, &cmp.value) {
            (JsonValue::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        },
        Operator::EndsWith => match (actual, &cmp.value) {
            (JsonValue::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        },
    }
}

fn values_equal(actual: &JsonValue, expected: &Value) -> bool {
    match (actual, expected) {
        (JsonValue::String(a), Value::String(b)) => a == b,
        (JsonValue::Bool(a), Value::Bool(b)) => a == b,
        (JsonValue::Number(a), Value::Number(b)) => a.as_f64() == Some(*b),
        (JsonValue::Array(items), Value::List(expected)) => {
            items.len() == expected.len()
                && items
                    .iter()
                    .zip(expected)
                    .all(|(item, e)| item.as_str() == Some(e.as_str()))
        }
        _ => false,
    }
}

fn compare_numbers(actual: &JsonValue, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected) {
        (Some(a), Value::Number(b)) => cmp(a, *b),
        _ => false,
    }
}

/// `None` when the operands are not comparable (the comparison is then false
/// for both `contains` and `not_contains`).
fn contains(actual: &JsonValue, needle: &Value) -> Option<bool> {
    match (actual, needle) {
        (JsonValue::String(s), Value::String(sub)) => Some(s.contains(sub.as_str())),
        (JsonValue::Array(_), Value::List(_)) => None,
        (JsonValue::Array(items), scalar) => Some(items.iter().any(|item| values_equal(item, scalar))),
        _ => None,
    }
}

fn member_of(actual: &JsonValue, list: &Value) -> Option<bool> {
    let Value::List(options) = list else {
        return None;
    };
    let needle = scalar_text(actual)?;
    Some(options.iter().any(|o| *o == needle))
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
