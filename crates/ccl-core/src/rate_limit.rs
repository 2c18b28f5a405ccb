// rate_limit.rs — Decides whether an action has exhausted its `limit`.
//
// Pure decision only: the caller owns the counter and the start of the
// current period and passes both in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Document, Limit};
use crate::matcher::{match_action, specificity};

/// Calls left in the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remaining {
    /// No limit applies to the action.
    Unlimited,
    Limited(u64),
}

impl Remaining {
    pub fn is_unlimited(self) -> bool {
        matches!(self, Remaining::Unlimited)
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Unlimited => f.write_str("unlimited"),
            Remaining::Limited(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResult {
    pub exceeded: bool,
    pub remaining: Remaining,
    pub matched_limit: Option<Limit>,
}

/// Check `used_count` calls of `action`, counted since `period_start_ms`,
/// against the most specific matching limit at time `now_ms`.
///
/// Ties in specificity go to the smaller count, then to document order.
pub fn check_rate_limit(
    doc: &Document,
    action: &str,
    used_count: u64,
    period_start_ms: i64,
    now_ms: i64,
) -> RateLimitResult {
    let Some(limit) = select_limit(doc, action) else {
        return RateLimitResult {
            exceeded: false,
            remaining: Remaining::Unlimited,
            matched_limit: None,
        };
    };

    let count = u64::from(limit.count);
    let period_ms = i64::from(limit.period_seconds) * 1000;
    let elapsed = now_ms.saturating_sub(period_start_ms);

    let (exceeded, remaining) = if elapsed >= period_ms {
        (false, count)
    } else {
        (used_count >= count, count.saturating_sub(used_count))
    };

    if exceeded {
        tracing::debug!(action, used_count, limit = limit.count, "rate limit exceeded");
    }

    RateLimitResult {
        exceeded,
        remaining: Remaining::Limited(remaining),
        matched_limit: Some(limit.clone()),
    }
}

fn select_limit<'a>(doc: &'a Document, action: &str) -> Option<&'a Limit> {
    let mut best: Option<(&Limit, u32)> = None;
    for limit in doc.limits().filter(|l| match_action(&l.action, action)) {
        let score = specificity(&limit.action, "");
        best = match best {
            Some((current, current_score))
                if current_score > score
                    || (current_score == score && current.count <= limit.count) =>
            {
                Some((current, current_score))
            }
            _ => Some((limit, score)),
        };
    }
    best.map(|(limit, _)| limit)
}
