// engine.rs — Document evaluation: is this action on this resource permitted?
//
// `evaluate()` is the single decision point:
//
// 1. Collect every permit / deny whose action and resource patterns match
//    and whose condition (if any) holds. Matching require statements are
//    reported too, but never decide anything.
// 2. No candidate → Deny (default deny).
// 3. Otherwise the most specific candidate wins. At equal specificity a
//    deny beats a permit; among equals of the same kind the earliest wins.
//
// `evaluate_with_trace()` runs the same algorithm and records what
// happened to every rule, for audit and debugging.

use serde::{Deserialize, Serialize};

use crate::ast::{Document, Rule, Severity, Statement};
use crate::condition::{evaluate_condition, Context};
use crate::matcher::{match_action, match_resource, specificity};

/// The outcome of evaluating a request against a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub permitted: bool,
    /// The permit or deny that decided the outcome; `None` under default deny.
    pub matched_rule: Option<Statement>,
    /// Every matching permit, deny, and require, in document order.
    pub all_matches: Vec<Statement>,
    pub reason: String,
    pub severity: Option<Severity>,
}

/// How a single rule fared during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Matched,
    ActionMismatch,
    ResourceMismatch,
    ConditionFalse,
}

/// One rule inspected during a traced evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStep {
    pub line: usize,
    /// The statement rendered as CCL.
    pub statement: String,
    pub specificity: u32,
    pub outcome: StepOutcome,
}

/// Full evaluation trace returned alongside an `EvaluationResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub result: EvaluationResult,
    /// One step per permit / deny / require statement, in document order.
    pub steps: Vec<EvaluationStep>,
    /// Index into `steps` of the deciding rule.
    pub winner: Option<usize>,
}

/// Evaluate a request against a document.
pub fn evaluate(doc: &Document, action: &str, resource: &str, context: &Context) -> EvaluationResult {
    evaluate_with_trace(doc, action, resource, context).result
}

/// Same decision as [`evaluate`], with a per-rule trace.
pub fn evaluate_with_trace(
    doc: &Document,
    action: &str,
    resource: &str,
    context: &Context,
) -> EvaluationTrace {
    let mut steps = Vec::new();
    let mut all_matches = Vec::new();
    // (step index, statement, specificity) of permit / deny candidates.
    let mut candidates: Vec<(usize, &Statement, u32)> = Vec::new();

    for statement in doc.statements() {
        let Some(rule) = statement.rule() else {
            continue;
        };
        let score = specificity(&rule.action, &rule.resource);
        let outcome = rule_outcome(rule, action, resource, context);
        if outcome == StepOutcome::Matched {
            all_matches.push(statement.clone());
            if !matches!(statement, Statement::Require(_)) {
                candidates.push((steps.len(), statement, score));
            }
        }
        steps.push(EvaluationStep {
            line: rule.line,
            statement: statement.to_string(),
            specificity: score,
            outcome,
        });
    }

    let Some((winner, statement)) = pick_winner(&candidates) else {
        tracing::debug!(action, resource, "no matching rules; default deny");
        return EvaluationTrace {
            result: EvaluationResult {
                permitted: false,
                matched_rule: None,
                all_matches,
                reason: format!(
                    "No matching rules for action '{action}' on resource '{resource}'; denied by default"
                ),
                severity: None,
            },
            steps,
            winner: None,
        };
    };

    let permitted = statement.is_permit();
    let verb = if permitted { "Permitted" } else { "Denied" };
    let reason = format!("{verb} by rule at line {}: {}", statement.line(), statement);
    tracing::debug!(action, resource, permitted, line = statement.line(), "evaluated request");

    EvaluationTrace {
        result: EvaluationResult {
            permitted,
            matched_rule: Some(statement.clone()),
            all_matches,
            reason,
            severity: Some(statement.severity()),
        },
        steps,
        winner: Some(winner),
    }
}

fn rule_outcome(rule: &Rule, action: &str, resource: &str, context: &Context) -> StepOutcome {
    if !match_action(&rule.action, action) {
        StepOutcome::ActionMismatch
    } else if !match_resource(&rule.resource, resource) {
        StepOutcome::ResourceMismatch
    } else if rule
        .condition
        .as_ref()
        .is_some_and(|c| !evaluate_condition(c, context))
    {
        StepOutcome::ConditionFalse
    } else {
        StepOutcome::Matched
    }
}

/// Highest specificity wins; deny beats permit in the top tier; the
/// earliest rule wins among otherwise equal candidates.
fn pick_winner<'a>(candidates: &[(usize, &'a Statement, u32)]) -> Option<(usize, &'a Statement)> {
    let top = candidates.iter().map(|(_, _, score)| *score).max()?;
    let tier = || candidates.iter().filter(move |(_, _, score)| *score == top);
    tier()
        .find(|(_, s, _)| s.is_deny())
        .or_else(|| tier().next())
        .map(|(idx, s, _)| (*idx, *s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> Context {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("context must be an object, got {:?}", other),
        }
    }

    fn no_ctx() -> Context {
        Context::new()
    }

    #[test]
    fn permit_on_exact_match() {
        let doc = parse("permit file.read on '/data'").unwrap();
        let result = evaluate(&doc, "file.read", "/data", &no_ctx());
        assert!(result.permitted);
        assert_eq!(result.severity, Some(Severity::High));
        assert!(result.reason.contains("line 1"));
    }

    #[test]
    fn default_deny_when_nothing_matches() {
        let doc = parse("permit file.read on '/data'").unwrap();
        let result = evaluate(&doc, "file.write", "/data", &no_ctx());
        assert!(!result.permitted);
        assert!(result.matched_rule.is_none());
        assert!(result.reason.contains("No matching rules"));
        assert_eq!(result.severity, None);
    }

    #[test]
    fn deny_wins_at_equal_specificity() {
        let doc = parse("permit file.read on '/data'\ndeny file.read on '/data' severity critical").unwrap();
        let result = evaluate(&doc, "file.read", "/data", &no_ctx());
        assert!(!result.permitted);
        match &result.matched_rule {
            Some(Statement::Deny(rule)) => assert_eq!(rule.line, 2),
            other => panic!("expected Deny, got {:?}", other),
        }
        assert_eq!(result.severity, Some(Severity::Critical));
        assert_eq!(result.all_matches.len(), 2);
    }

    #[test]
    fn more_specific_permit_beats_broad_deny() {
        let doc = parse("deny file.* on '**'\npermit file.read on '/data/public'").unwrap();
        assert!(evaluate(&doc, "file.read", "/data/public", &no_ctx()).permitted);
        assert!(!evaluate(&doc, "file.read", "/data/private", &no_ctx()).permitted);
    }

    #[test]
    fn more_specific_deny_beats_broad_permit() {
        let doc = parse("permit file.** on '/data/**'\ndeny file.delete on '/data/secret'").unwrap();
        assert!(!evaluate(&doc, "file.delete", "/data/secret", &no_ctx()).permitted);
        assert!(evaluate(&doc, "file.delete", "/data/other", &no_ctx()).permitted);
    }

    #[test]
    fn condition_gates_a_rule() {
        let doc = parse("permit file.read on '/data' when user.role = 'admin'").unwrap();
        let admin = ctx(json!({ "user": { "role": "admin" } }));
        let guest = ctx(json!({ "user": { "role": "guest" } }));
        assert!(evaluate(&doc, "file.read", "/data", &admin).permitted);
        let denied = evaluate(&doc, "file.read", "/data", &guest);
        assert!(!denied.permitted);
        assert!(denied.all_matches.is_empty());
    }

    #[test]
    fn require_never_affects_permitted() {
        let doc = parse("require audit.log on '**'\npermit file.read on '/data'").unwrap();
        let result = evaluate(&doc, "audit.log", "/anything", &no_ctx());
        assert!(!result.permitted);
        assert_eq!(result.all_matches.len(), 1);
        assert!(matches!(result.all_matches[0], Statement::Require(_)));
        assert!(result.matched_rule.is_none());
    }

    #[test]
    fn all_matches_keep_document_order() {
        let doc = parse(
            "permit ** on '**'\ndeny file.* on '/data'\npermit file.read on '/data'",
        )
        .unwrap();
        let result = evaluate(&doc, "file.read", "/data", &no_ctx());
        let lines: Vec<usize> = result.all_matches.iter().map(Statement::line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(result.permitted);
    }

    #[test]
    fn earliest_permit_wins_among_equal_permits() {
        let doc = parse("permit file.* on '/a' severity low\npermit *.read on '/a' severity medium").unwrap();
        let result = evaluate(&doc, "file.read", "/a", &no_ctx());
        assert_eq!(result.severity, Some(Severity::Low));
    }

    #[test]
    fn trace_records_outcomes_per_rule() {
        let doc = parse(
            "permit file.read on '/data' when ok = true\n\
             deny file.write on '/data'\n\
             permit file.read on '/other'\n\
             limit file.read 5 per 60 seconds\n\
             permit file.* on '/data'",
        )
        .unwrap();
        let trace = evaluate_with_trace(&doc, "file.read", "/data", &no_ctx());

        let outcomes: Vec<StepOutcome> = trace.steps.iter().map(|s| s.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                StepOutcome::ConditionFalse,
                StepOutcome::ActionMismatch,
                StepOutcome::ResourceMismatch,
                StepOutcome::Matched,
            ]
        );
        assert_eq!(trace.winner, Some(3));
        assert_eq!(trace.steps[3].line, 5);
        assert_eq!(trace.steps[3].specificity, 5);
        assert!(trace.result.permitted);
    }

    #[test]
    fn trace_serialization_round_trip() {
        let doc = parse("permit file.read on '/data'").unwrap();
        let trace = evaluate_with_trace(&doc, "file.read", "/data", &no_ctx());
        let json = serde_json::to_string(&trace).unwrap();
        let restored: EvaluationTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, trace);
    }
}
