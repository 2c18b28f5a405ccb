// matcher.rs — Action / resource pattern matching and specificity.
//
// Actions are split on `.`, resources on `/` (leading and trailing slashes
// are ignored). Patterns compare segment by segment:
//
// - a literal segment matches only the identical segment
// - `*` matches exactly one segment
// - `**` matches zero or more segments, anywhere in the pattern
//
// Besides matching concrete values, this module answers two questions
// about pairs of patterns, used by narrowing validation: can they match a
// common value (overlap), and does one match everything the other does
// (covers). Both answers are sound but not complete: `false` from `covers`
// may mean "could not prove it".

const SINGLE: &str = "*";
const MULTI: &str = "**";

/// Does a concrete action (e.g. `file.read`) match an action pattern?
pub fn match_action(pattern: &str, action: &str) -> bool {
    match_segments(&action_segments(pattern), &action_segments(action))
}

/// Does a concrete resource path match a resource pattern?
pub fn match_resource(pattern: &str, resource: &str) -> bool {
    match_segments(&resource_segments(pattern), &resource_segments(resource))
}

/// Specificity of a rule: literal segments score 2, `*` scores 1, `**` scores 0,
/// summed over both patterns. Higher means narrower.
pub fn specificity(action_pattern: &str, resource_pattern: &str) -> u32 {
    segment_score(&action_segments(action_pattern)) + segment_score(&resource_segments(resource_pattern))
}

pub(crate) fn action_segments(value: &str) -> Vec<&str> {
    if value.is_empty() {
        Vec::new()
    } else {
        value.split('.').collect()
    }
}

pub(crate) fn resource_segments(value: &str) -> Vec<&str> {
    let trimmed = value.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn segment_score(segments: &[&str]) -> u32 {
    segments
        .iter()
        .map(|s| match *s {
            MULTI => 0,
            SINGLE => 1,
            _ => 2,
        })
        .sum()
}

// The three segment relations below are decided over a table indexed by
// (position in the first list, position in the second list), filled from
// the ends backwards. Each cell reads only cells to its right or below, so
// every relation runs in O(len(a) * len(b)) however many `**` there are.

/// `done[i][j]` answers the relation for `a[i..]` against `b[j..]`.
struct Table {
    width: usize,
    cells: Vec<bool>,
}

impl Table {
    fn solve(a_len: usize, b_len: usize, cell: impl Fn(&Table, usize, usize) -> bool) -> bool {
        let width = b_len + 1;
        let mut table = Table {
            width,
            cells: vec![false; (a_len + 1) * width],
        };
        for i in (0..=a_len).rev() {
            for j in (0..=b_len).rev() {
                let value = cell(&table, i, j);
                table.cells[i * width + j] = value;
            }
        }
        table.at(0, 0)
    }

    fn at(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.width + j]
    }
}

fn match_segments(pattern: &[&str], value: &[&str]) -> bool {
    Table::solve(pattern.len(), value.len(), |t, i, j| {
        let more = j < value.len();
        match pattern.get(i) {
            None => !more,
            Some(&MULTI) => t.at(i + 1, j) || (more && t.at(i, j + 1)),
            Some(&SINGLE) => more && t.at(i + 1, j + 1),
            Some(literal) => more && value[j] == *literal && t.at(i + 1, j + 1),
        }
    })
}

/// Whether some concrete value matches both patterns.
pub(crate) fn segments_overlap(a: &[&str], b: &[&str]) -> bool {
    Table::solve(a.len(), b.len(), |t, i, j| match (a.get(i), b.get(j)) {
        (None, None) => true,
        (Some(&MULTI), _) => t.at(i + 1, j) || (j < b.len() && t.at(i, j + 1)),
        (_, Some(&MULTI)) => t.at(i, j + 1) || (i < a.len() && t.at(i + 1, j)),
        (None, Some(_)) | (Some(_), None) => false,
        (Some(x), Some(y)) => (*x == SINGLE || *y == SINGLE || x == y) && t.at(i + 1, j + 1),
    })
}

/// Whether every concrete value matching `specific` also matches `general`.
pub(crate) fn segments_cover(general: &[&str], specific: &[&str]) -> bool {
    Table::solve(general.len(), specific.len(), |t, i, j| {
        match (general.get(i), specific.get(j)) {
            (None, _) => j == specific.len(),
            (Some(&MULTI), _) => t.at(i + 1, j) || (j < specific.len() && t.at(i, j + 1)),
            (Some(_), None) => false,
            // A single segment of `general` cannot absorb an unbounded run.
            (Some(_), Some(&MULTI)) => false,
            (Some(&SINGLE), Some(_)) => t.at(i + 1, j + 1),
            (Some(g), Some(s)) => g == s && t.at(i + 1, j + 1),
        }
    })
}

/// Whether an action pattern and a resource pattern pair can both match
/// the same concrete request as another pair.
pub fn rules_overlap(
    action_a: &str,
    resource_a: &str,
    action_b: &str,
    resource_b: &str,
) -> bool {
    segments_overlap(&action_segments(action_a), &action_segments(action_b))
        && segments_overlap(&resource_segments(resource_a), &resource_segments(resource_b))
}

/// Whether the `general` action/resource pair matches every request the
/// `specific` pair matches.
pub fn rule_covers(
    general_action: &str,
    general_resource: &str,
    specific_action: &str,
    specific_resource: &str,
) -> bool {
    segments_cover(&action_segments(general_action), &action_segments(specific_action))
        && segments_cover(
            &resource_segments(general_resource),
            &resource_segments(specific_resource),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn exact_action_match() {
        assert!(match_action("file.read", "file.read"));
        assert!(!match_action("file.read", "file.write"));
        assert!(!match_action("file.read", "file.read.all"));
    }

    #[test]
    fn single_wildcard_matches_exactly_one_segment() {
        assert!(match_action("file.*", "file.read"));
        assert!(!match_action("file.*", "file"));
        assert!(!match_action("file.*", "file.read.deep"));
        assert!(match_action("*.read", "db.read"));
    }

    #[test]
    fn double_wildcard_matches_zero_or_more() {
        assert!(match_action("file.**", "file"));
        assert!(match_action("file.**", "file.read"));
        assert!(match_action("file.**", "file.read.deep"));
        assert!(match_action("**", "anything.at.all"));
        assert!(match_action("**", ""));
    }

    #[test]
    fn interior_double_wildcard_backtracks() {
        assert!(match_action("a.**.c", "a.c"));
        assert!(match_action("a.**.c", "a.b.c"));
        assert!(match_action("a.**.c", "a.b.x.c"));
        assert!(!match_action("a.**.c", "a.b.c.d"));
        assert!(match_action("**.c.**.e", "a.b.c.d.e"));
        assert!(match_action("a.**.**.c", "a.c"));
    }

    #[test]
    fn stacked_double_wildcards_stay_fast() {
        let pattern = format!("{}b", "**.a.".repeat(12));
        let value = vec!["a"; 80].join(".");
        let pattern_hit = format!("{}.b", value);

        let started = Instant::now();
        assert!(!match_action(&pattern, &value));
        assert!(match_action(&pattern, &pattern_hit));
        let resource = format!("/{}", "**/a/".repeat(12));
        assert!(match_resource(&resource, &format!("/{}", vec!["a"; 80].join("/"))));
        assert!(rules_overlap(&pattern, "**", &pattern_hit, "/x"));
        assert!(!rule_covers(&pattern, "**", "**", "/x"));
        assert!(rule_covers("**", "**", &pattern, "/x"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn resource_slashes_are_normalized() {
        assert!(match_resource("/data", "data/"));
        assert!(match_resource("/data/*", "/data/file.txt"));
        assert!(!match_resource("/data/*", "/data/a/b"));
        assert!(match_resource("/data/**", "/data"));
        assert!(match_resource("/data/**", "/data/a/b/c"));
        assert!(!match_resource("/data/**", "/other/a"));
    }

    #[test]
    fn empty_pattern_matches_empty_resource() {
        assert!(match_resource("", ""));
        assert!(match_resource("**", ""));
        assert!(!match_resource("", "/data"));
    }

    #[test]
    fn specificity_scores() {
        assert_eq!(specificity("file.read", "/data"), 6);
        assert_eq!(specificity("file.*", ""), 3);
        assert_eq!(specificity("**", ""), 0);
        assert_eq!(specificity("**", "**"), 0);
        assert_eq!(specificity("a.**.c", "/x/*"), 7);
    }

    #[test]
    fn overlap_of_patterns() {
        assert!(rules_overlap("file.delete", "/system", "file.*", "**"));
        assert!(rules_overlap("file.**", "/a/*", "*.read", "/a/b"));
        assert!(!rules_overlap("file.read", "/a", "file.write", "/a"));
        assert!(!rules_overlap("file.*", "/a", "file", "/a"));
        assert!(rules_overlap("**", "**", "x.y.z", "/p/q"));
    }

    #[test]
    fn covering_patterns() {
        assert!(rule_covers("file.*", "/data/**", "file.read", "/data/reports/q1"));
        assert!(rule_covers("**", "**", "file.*", "/x/**"));
        assert!(rule_covers("file.**", "/data/**", "file.*", "/data/*"));
        assert!(!rule_covers("file.read", "/data", "file.*", "/data"));
        assert!(!rule_covers("file.*", "/data", "file.**", "/data"));
        assert!(!rule_covers("file.read", "/data/*", "file.read", "/data/**"));
        assert!(rule_covers("file.read", "/data", "file.read", "/data"));
    }
}
