// serializer.rs — Renders a `Document` back to CCL source.
//
// Output is canonical: one statement per line, resources always quoted,
// default severity omitted, compound sub-conditions parenthesized. Parsing
// the output yields a document that evaluates identically to the input.

use std::fmt;

use crate::ast::{Condition, Document, Limit, Rule, Severity, Statement, Value};

/// Render a document as CCL source text, one statement per line.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for statement in doc.statements() {
        out.push_str(&statement.to_string());
        out.push('\n');
    }
    out
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Permit(rule) | Statement::Deny(rule) | Statement::Require(rule) => {
                write_rule(f, self.keyword(), rule)
            }
            Statement::Limit(limit) => write_limit(f, limit),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare(cmp) => {
                write!(f, "{} {} ", cmp.field, cmp.operator)?;
                write_value(f, &cmp.value)
            }
            Condition::And { children } => write_joined(f, children, "and"),
            Condition::Or { children } => write_joined(f, children, "or"),
            Condition::Not { child } => {
                f.write_str("not ")?;
                write_operand(f, child)
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

fn write_rule(f: &mut fmt::Formatter<'_>, keyword: &str, rule: &Rule) -> fmt::Result {
    write!(f, "{} {} on {}", keyword, rule.action, quote(&rule.resource))?;
    if let Some(condition) = &rule.condition {
        write!(f, " when {condition}")?;
    }
    write_severity(f, rule.severity)
}

fn write_limit(f: &mut fmt::Formatter<'_>, limit: &Limit) -> fmt::Result {
    write!(
        f,
        "limit {} {} per {} seconds",
        limit.action, limit.count, limit.period_seconds
    )?;
    write_severity(f, limit.severity)
}

fn write_severity(f: &mut fmt::Formatter<'_>, severity: Severity) -> fmt::Result {
    if severity == Severity::default() {
        Ok(())
    } else {
        write!(f, " severity {severity}")
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Condition], connective: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {connective} ")?;
        }
        write_operand(f, child)?;
    }
    Ok(())
}

/// Compound operands are always parenthesized; `and`/`or` share a
/// precedence level, so dropping them could regroup the tree.
fn write_operand(f: &mut fmt::Formatter<'_>, condition: &Condition) -> fmt::Result {
    match condition {
        Condition::And { .. } | Condition::Or { .. } => write!(f, "({condition})"),
        Condition::Compare(_) | Condition::Not { .. } => write!(f, "{condition}"),
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => f.write_str(&quote(s)),
        Value::Number(n) => f.write_str(&format_number(*n)),
        Value::Bool(b) => write!(f, "{b}"),
        Value::List(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&quote(item))?;
            }
            f.write_str("]")
        }
    }
}

/// Strings are escape-free, so pick the quote character the text lacks.
/// Parsed text never holds both: quoted strings exclude their own quote and
/// bare paths end at either one.
fn quote(text: &str) -> String {
    if text.contains('\'') {
        format!("\"{text}\"")
    } else {
        format!("'{text}'")
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn default_severity_is_omitted() {
        let doc = parse("permit file.read on '/data' severity high").unwrap();
        assert_eq!(serialize(&doc), "permit file.read on '/data'\n");
    }

    #[test]
    fn non_default_severity_is_kept() {
        let doc = parse("deny file.delete on /system severity critical").unwrap();
        assert_eq!(
            serialize(&doc),
            "deny file.delete on '/system' severity critical\n"
        );
    }

    #[test]
    fn limit_statement_renders() {
        let doc = parse("limit api.call 100 per 60 seconds").unwrap();
        assert_eq!(serialize(&doc), "limit api.call 100 per 60 seconds\n");
    }

    #[test]
    fn conditions_render_with_grouping() {
        let doc = parse(
            "permit a on '/x' when not (env = 'prod' or tier in ['gold']) and size <= 10.5",
        )
        .unwrap();
        assert_eq!(
            serialize(&doc),
            "permit a on '/x' when not (env = 'prod' or tier in ['gold']) and size <= 10.5\n"
        );
    }

    #[test]
    fn integral_numbers_have_no_fraction() {
        let doc = parse("require audit.log on '**' when count > 3 and ok = false").unwrap();
        assert_eq!(
            serialize(&doc),
            "require audit.log on '**' when count > 3 and ok = false\n"
        );
    }

    #[test]
    fn strings_containing_single_quotes_use_double_quotes() {
        let doc = parse("permit a on '/x' when name = \"o'brien\"").unwrap();
        let text = serialize(&doc);
        assert!(text.contains("\"o'brien\""));
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn serialize_then_parse_preserves_structure() {
        let source = "permit file.* on /data/** when user.role = admin\n\
                      deny file.delete on '/data/secret' severity critical\n\
                      require log.write on '**'\n\
                      limit file.read 10 per 60 seconds severity low";
        let doc = parse(source).unwrap();
        let reparsed = parse(&serialize(&doc)).unwrap();
        assert_eq!(reparsed.statements().len(), doc.statements().len());
        for (a, b) in doc.statements().iter().zip(reparsed.statements()) {
            assert_eq!(a.to_string(), b.to_string());
        }
    }

    #[test]
    fn every_quoting_form_round_trips() {
        let sources = [
            "permit a on '/x\"y'",
            "permit a on \"/x'y\"",
            "permit a on /bare/path/**",
            "permit a on /x#y",
            "permit a on *",
            "permit a on **",
            "permit a on reports",
            "permit a on ''",
            "permit a on '/x' when name = 'say \"hi\"'",
            "permit a on '/x' when name = \"it's\"",
            "permit a on '/x' when name = admin",
            "permit a on '/x' when code = '007'",
            "permit a on '/x' when tag in ['a\"b', \"c'd\", 'plain']",
        ];
        for source in sources {
            let doc = parse(source).unwrap();
            let text = serialize(&doc);
            let reparsed = parse(&text).unwrap_or_else(|e| panic!("{source:?} -> {text:?}: {e}"));
            assert_eq!(reparsed, doc, "{source:?} -> {text:?}");
        }
    }

    #[test]
    fn bare_path_with_both_quotes_is_rejected() {
        assert!(parse("permit a on /x'y\"z").is_err());
    }
}
