// narrowing.rs — Checks that a delegated (child) document grants no more
// access than its parent.
//
// Only child permits can widen access. For each one:
//
// (a) It must not overlap a parent deny, unless that deny is already
//     neutralized: either the parent itself overrides it there with a more
//     specific covering permit, or the child carries its own deny that
//     covers the overlap and outranks the child permit.
// (b) Some parent permit must cover it: a superset of its action and
//     resource patterns, with no condition the child permit does not also
//     require.
//
// Pattern containment is conservative: when containment cannot be proven
// the rule is reported. Conditions are compared structurally.

use serde::{Deserialize, Serialize};

use crate::ast::{Condition, Document, Rule, Statement};
use crate::error::CclError;
use crate::matcher::{rule_covers, rules_overlap, specificity};

/// A child permit that exceeds what the parent allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrowingViolation {
    pub child_rule: Rule,
    /// The parent deny the child permit conflicts with. `None` when the
    /// violation is that no parent permit covers the child permit.
    pub parent_rule: Option<Statement>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrowingResult {
    pub valid: bool,
    pub violations: Vec<NarrowingViolation>,
}

impl NarrowingResult {
    /// Turn an invalid result into a validation error listing every violation.
    pub fn into_result(self) -> Result<(), CclError> {
        if self.valid {
            return Ok(());
        }
        let message = self
            .violations
            .iter()
            .map(|v| v.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(CclError::Validation { message })
    }
}

/// Validate that `child` only narrows `parent`.
pub fn validate_narrowing(parent: &Document, child: &Document) -> NarrowingResult {
    let mut violations = Vec::new();

    for permit in child.permits() {
        let covering: Vec<&Rule> = parent
            .permits()
            .filter(|p| covers(p, permit) && condition_implied(p.condition.as_ref(), permit))
            .collect();

        for deny in parent.denies() {
            if !rules_overlap(&permit.action, &permit.resource, &deny.action, &deny.resource) {
                continue;
            }
            let deny_score = specificity(&deny.action, &deny.resource);
            let overridden_by_parent = covering
                .iter()
                .any(|p| specificity(&p.action, &p.resource) > deny_score);
            let reinstated_by_child = child.denies().any(|own| {
                covers_intersection(own, permit, deny)
                    && (own.condition.is_none() || own.condition == deny.condition)
                    && specificity(&own.action, &own.resource)
                        >= specificity(&permit.action, &permit.resource)
            });
            if overridden_by_parent || reinstated_by_child {
                continue;
            }
            violations.push(NarrowingViolation {
                child_rule: permit.clone(),
                parent_rule: Some(Statement::Deny(deny.clone())),
                reason: format!(
                    "child permit '{}' on '{}' (line {}) overlaps parent deny '{}' on '{}' (line {})",
                    permit.action, permit.resource, permit.line, deny.action, deny.resource, deny.line
                ),
            });
        }

        if covering.is_empty() {
            violations.push(NarrowingViolation {
                child_rule: permit.clone(),
                parent_rule: None,
                reason: format!(
                    "child permit '{}' on '{}' (line {}) is not covered by any parent permit",
                    permit.action, permit.resource, permit.line
                ),
            });
        }
    }

    tracing::debug!(violations = violations.len(), "validated narrowing");
    NarrowingResult {
        valid: violations.is_empty(),
        violations,
    }
}

fn covers(general: &Rule, specific: &Rule) -> bool {
    rule_covers(
        &general.action,
        &general.resource,
        &specific.action,
        &specific.resource,
    )
}

/// Whether `rule` matches every request matched by both `a` and `b`. Each
/// dimension of the intersection is contained in either side's pattern, so
/// covering one side per dimension is enough.
fn covers_intersection(rule: &Rule, a: &Rule, b: &Rule) -> bool {
    let action = |other: &Rule| rule_covers(&rule.action, "", &other.action, "");
    let resource = |other: &Rule| rule_covers("", &rule.resource, "", &other.resource);
    (action(a) || action(b)) && (resource(a) || resource(b))
}

/// A conditional parent permit only covers a child permit that requires
/// the same condition, either exactly or as one conjunct of an `and`.
fn condition_implied(parent: Option<&Condition>, child: &Rule) -> bool {
    let Some(required) = parent else {
        return true;
    };
    match &child.condition {
        None => false,
        Some(own) if own == required => true,
        Some(Condition::And { children }) => children.iter().any(|c| c == required),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn check(parent: &str, child: &str) -> NarrowingResult {
        validate_narrowing(&parse(parent).unwrap(), &parse(child).unwrap())
    }

    #[test]
    fn child_permit_against_parent_deny_is_a_violation() {
        let result = check("deny file.delete on '/system'", "permit file.delete on '/system'");
        assert!(!result.valid);
        let deny_violation = result
            .violations
            .iter()
            .find(|v| v.parent_rule.is_some())
            .unwrap();
        assert_eq!(deny_violation.child_rule.action, "file.delete");
        match &deny_violation.parent_rule {
            Some(Statement::Deny(rule)) => assert_eq!(rule.resource, "/system"),
            other => panic!("expected parent Deny, got {:?}", other),
        }
    }

    #[test]
    fn identical_documents_are_valid() {
        let source = "permit file.** on '**'\n\
                      deny file.delete on '/system'\n\
                      permit file.delete on '/system/tmp'\n\
                      limit file.read 10 per 60 seconds";
        let result = check(source, source);
        assert!(result.valid, "{:?}", result.violations);
    }

    #[test]
    fn empty_child_is_valid() {
        let parent = parse("permit file.read on '/data'").unwrap();
        let result = validate_narrowing(&parent, &Document::default());
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn narrower_child_permit_is_valid() {
        let result = check("permit file.* on '/data/**'", "permit file.read on '/data/reports'");
        assert!(result.valid);
    }

    #[test]
    fn broader_child_permit_is_a_violation() {
        let result = check("permit file.read on '/data'", "permit file.* on '/data'");
        assert!(!result.valid);
        assert!(result.violations[0].parent_rule.is_none());
        assert!(result.violations[0].reason.contains("not covered"));
    }

    #[test]
    fn single_level_wildcard_overlap_with_deny() {
        let result = check(
            "permit file.* on '/data/*'\ndeny file.delete on '/data/*'",
            "permit file.* on '/data/reports'",
        );
        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].parent_rule.is_some());
    }

    #[test]
    fn child_deny_reinstating_parent_deny_is_valid() {
        let result = check(
            "permit file.* on '/data/*'\ndeny file.delete on '/data/*'",
            "permit file.* on '/data/reports'\ndeny file.delete on '/data/reports'",
        );
        assert!(result.valid, "{:?}", result.violations);
    }

    #[test]
    fn child_deny_outranked_by_child_permit_does_not_help() {
        let result = check(
            "permit file.* on '/data/*'\ndeny file.delete on '/data/*'",
            "permit file.* on '/data/reports'\ndeny file.delete on '/data/*'",
        );
        assert!(!result.valid);
    }

    #[test]
    fn parent_override_of_its_own_deny_is_respected() {
        let result = check(
            "deny file.** on '**'\npermit file.read on '/data/public'",
            "permit file.read on '/data/public'",
        );
        assert!(result.valid, "{:?}", result.violations);
    }

    #[test]
    fn child_deny_require_and_limit_never_violate() {
        let result = check(
            "permit file.read on '/data'",
            "deny ** on '**'\nrequire audit.log on '**'\nlimit ** 1 per 1 seconds",
        );
        assert!(result.valid);
    }

    #[test]
    fn conditional_parent_permit_needs_matching_condition() {
        let parent = "permit file.read on '/data' when user.role = 'admin'";
        assert!(!check(parent, "permit file.read on '/data'").valid);
        assert!(check(parent, "permit file.read on '/data' when user.role = 'admin'").valid);
        assert!(check(
            parent,
            "permit file.read on '/data' when user.role = 'admin' and mfa = true"
        )
        .valid);
    }

    #[test]
    fn into_result_reports_validation_error() {
        let err = check("deny a on '/x'", "permit a on '/x'").into_result().unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.message().contains("overlaps parent deny"));
        assert!(check("permit a on '/x'", "permit a on '/x'").into_result().is_ok());
    }
}
