// merge.rs — Layers a child document on top of a parent.
//
// Permits, denies, and obligations are additive: parent statements first,
// then child statements, each in source order. Limits are grouped by their
// exact action pattern and only the most restrictive (smallest count) of
// each group survives, in the position of the group's first occurrence.
// Count ties keep the earlier limit, so the parent's wins.

use std::collections::HashMap;

use crate::ast::{Document, Limit, Statement};

/// Merge `child` into `parent`, producing a new document.
pub fn merge(parent: &Document, child: &Document) -> Document {
    let combined = || parent.statements().iter().chain(child.statements());

    let mut strictest: HashMap<&str, &Limit> = HashMap::new();
    for statement in combined() {
        if let Statement::Limit(limit) = statement {
            strictest
                .entry(limit.action.as_str())
                .and_modify(|kept| {
                    if limit.count < kept.count {
                        *kept = limit;
                    }
                })
                .or_insert(limit);
        }
    }

    let mut statements = Vec::with_capacity(parent.len() + child.len());
    for statement in combined() {
        match statement {
            Statement::Limit(limit) => {
                // Emit each group once, at its first position.
                if let Some(winner) = strictest.remove(limit.action.as_str()) {
                    statements.push(Statement::Limit(winner.clone()));
                }
            }
            Statement::Permit(_) | Statement::Deny(_) | Statement::Require(_) => {
                statements.push(statement.clone());
            }
        }
    }

    tracing::debug!(
        parent = parent.len(),
        child = child.len(),
        merged = statements.len(),
        "merged CCL documents"
    );
    Document::new(statements)
}
