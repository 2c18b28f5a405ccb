// parser.rs — Recursive-descent parser from tokens to a `Document`.
//
// Grammar:
//
//   program    := statement (NEWLINE statement)* EOF
//   statement  := ('permit' | 'deny' | 'require') action 'on' resource
//                     ['when' condition] ['severity' level]
//               | 'limit' action NUMBER 'per' NUMBER 'seconds' ['severity' level]
//   action     := segment ('.' segment)*        segment := word | '*' | '**'
//   resource   := STRING | '*' | '**' | word
//   condition  := not_expr (('and' | 'or') not_expr)*
//   not_expr   := 'not' not_expr | '(' condition ')' | field OPERATOR value
//   value      := STRING | NUMBER | 'true' | 'false' | word | '[' STRING (',' STRING)* ']'
//
// `and` and `or` share one precedence level and associate left; `not`
// binds tighter than both. Every error carries the offending token's
// position. Nested `not` and `(` are capped at `MAX_NESTING` levels.

use regex::Regex;

use crate::ast::{Condition, Document, Limit, Operator, Rule, Severity, Statement, Value};
use crate::error::CclError;
use crate::token::{Token, TokenKind};

/// Deepest run of nested `not` / `(` a condition may contain.
pub const MAX_NESTING: usize = 128;

/// Parse a token stream (as produced by `tokenize`) into a `Document`.
pub fn parse_tokens(tokens: &[Token]) -> Result<Document, CclError> {
    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();

    loop {
        parser.skip_separators();
        if parser.at(TokenKind::Eof) {
            break;
        }
        statements.push(parser.statement()?);
        parser.end_of_statement()?;
    }

    if statements.is_empty() {
        let eof = parser.current();
        return Err(CclError::syntax(
            eof.line,
            eof.column,
            "CCL source contains no statements",
        ));
    }

    tracing::debug!(statements = statements.len(), "parsed CCL document");
    Ok(Document::new(statements))
}

struct Parser<'a> {
    /// Comments carry no meaning, so they are dropped up front. That also
    /// lets them sit inside a condition that spans lines.
    tokens: Vec<&'a Token>,
    pos: usize,
    eof: Token,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let eof = match tokens.last() {
            Some(last) => Token::new(TokenKind::Eof, "", last.line, last.column),
            None => Token::new(TokenKind::Eof, "", 1, 1),
        };
        Self {
            tokens: tokens.iter().filter(|t| t.kind != TokenKind::Comment).collect(),
            pos: 0,
            eof,
            nesting: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).copied().unwrap_or(&self.eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> CclError {
        let token = self.current();
        CclError::syntax(token.line, token.column, message)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CclError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected {what}, found {}", self.current())))
        }
    }

    fn skip_separators(&mut self) {
        while self.at(TokenKind::Newline) {
            self.advance();
        }
    }

    fn end_of_statement(&mut self) -> Result<(), CclError> {
        match self.current().kind {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            _ => Err(self.error_here(format!(
                "unexpected {} after end of statement",
                self.current()
            ))),
        }
    }

    fn statement(&mut self) -> Result<Statement, CclError> {
        let keyword = self.current().clone();
        match keyword.kind {
            TokenKind::Permit => {
                self.advance();
                Ok(Statement::Permit(self.rule(keyword.line)?))
            }
            TokenKind::Deny => {
                self.advance();
                Ok(Statement::Deny(self.rule(keyword.line)?))
            }
            TokenKind::Require => {
                self.advance();
                Ok(Statement::Require(self.rule(keyword.line)?))
            }
            TokenKind::Limit => {
                self.advance();
                Ok(Statement::Limit(self.limit(keyword.line)?))
            }
            _ => Err(self.error_here(format!(
                "unexpected {}: expected a statement keyword (permit, deny, require, limit)",
                keyword
            ))),
        }
    }

    fn rule(&mut self, line: usize) -> Result<Rule, CclError> {
        let action = self.action_pattern()?;
        if !self.at(TokenKind::On) {
            return Err(self.error_here(format!(
                "expected 'on' after action pattern, found {}",
                self.current()
            )));
        }
        self.advance();
        let resource = self.resource()?;

        let condition = if self.at(TokenKind::When) {
            self.advance();
            Some(self.condition()?)
        } else {
            None
        };
        let severity = self.severity()?;

        Ok(Rule {
            action,
            resource,
            condition,
            severity,
            line,
        })
    }

    fn limit(&mut self, line: usize) -> Result<Limit, CclError> {
        let action = self.action_pattern()?;
        if !self.at(TokenKind::Number) {
            return Err(self.error_here(format!(
                "expected count after limit action, found {}",
                self.current()
            )));
        }
        let count = self.whole_number("limit count")?;
        self.expect(TokenKind::Per, "'per'")?;
        if !self.at(TokenKind::Number) {
            return Err(self.error_here(format!(
                "expected period in seconds after 'per', found {}",
                self.current()
            )));
        }
        let period_token = self.current().clone();
        let period_seconds = self.whole_number("limit period")?;
        if period_seconds == 0 {
            return Err(CclError::syntax(
                period_token.line,
                period_token.column,
                "limit period must be greater than zero",
            ));
        }
        self.expect(TokenKind::Seconds, "'seconds'")?;
        let severity = self.severity()?;

        Ok(Limit {
            action,
            count,
            period_seconds,
            severity,
            line,
        })
    }

    fn whole_number(&mut self, what: &str) -> Result<u32, CclError> {
        let token = self.advance();
        token.text.parse::<u32>().map_err(|_| {
            CclError::syntax(
                token.line,
                token.column,
                format!("{what} must be a non-negative integer, found '{}'", token.text),
            )
        })
    }

    fn severity(&mut self) -> Result<Severity, CclError> {
        if !self.at(TokenKind::Severity) {
            return Ok(Severity::default());
        }
        self.advance();
        let token = self.current().clone();
        match Severity::parse(&token.text).filter(|_| token.kind == TokenKind::Identifier) {
            Some(level) => {
                self.advance();
                Ok(level)
            }
            None => Err(CclError::syntax(
                token.line,
                token.column,
                format!(
                    "invalid severity {}: expected critical, high, medium, or low",
                    token
                ),
            )),
        }
    }

    fn action_pattern(&mut self) -> Result<String, CclError> {
        let mut pattern = self.action_segment(true)?;
        while self.at(TokenKind::Dot) {
            self.advance();
            pattern.push('.');
            pattern.push_str(&self.action_segment(false)?);
        }
        Ok(pattern)
    }

    /// After a dot any word is a valid segment, so `tool.limit` or
    /// `doc.contains` still read as actions.
    fn action_segment(&mut self, first: bool) -> Result<String, CclError> {
        let token = self.current();
        let kind = token.kind;
        let word_after_dot = !first
            && (kind.is_word()
                || (kind == TokenKind::Operator
                    && token.text.chars().all(|c| c.is_alphabetic() || c == '_')));
        match kind {
            TokenKind::Identifier | TokenKind::Wildcard | TokenKind::DoubleWildcard => {
                Ok(self.advance().text)
            }
            _ if word_after_dot => Ok(self.advance().text),
            _ => Err(self.error_here(format!(
                "expected action pattern, found {}",
                self.current()
            ))),
        }
    }

    fn resource(&mut self) -> Result<String, CclError> {
        let kind = self.current().kind;
        match kind {
            TokenKind::String
            | TokenKind::Wildcard
            | TokenKind::DoubleWildcard
            | TokenKind::Identifier => Ok(self.advance().text),
            _ => Err(self.error_here(format!(
                "expected resource after 'on', found {}",
                self.current()
            ))),
        }
    }

    fn condition(&mut self) -> Result<Condition, CclError> {
        let mut result = self.not_expr()?;
        loop {
            let is_and = match self.current().kind {
                TokenKind::And => true,
                TokenKind::Or => false,
                _ => return Ok(result),
            };
            self.advance();
            let rhs = self.not_expr()?;
            result = match (result, is_and) {
                (Condition::And { mut children }, true) => {
                    children.push(rhs);
                    Condition::And { children }
                }
                (Condition::Or { mut children }, false) => {
                    children.push(rhs);
                    Condition::Or { children }
                }
                (lhs, true) => Condition::And {
                    children: vec![lhs, rhs],
                },
                (lhs, false) => Condition::Or {
                    children: vec![lhs, rhs],
                },
            };
        }
    }

    fn not_expr(&mut self) -> Result<Condition, CclError> {
        let kind = self.current().kind;
        if !matches!(kind, TokenKind::Not | TokenKind::LParen) {
            return self.comparison();
        }
        if self.nesting >= MAX_NESTING {
            return Err(self.error_here(format!(
                "condition nested more than {MAX_NESTING} levels deep"
            )));
        }
        self.nesting += 1;
        self.advance();
        let result = if kind == TokenKind::Not {
            self.not_expr().map(Condition::negate)
        } else {
            self.condition().and_then(|inner| {
                self.expect(TokenKind::RParen, "')' to close condition group")?;
                Ok(inner)
            })
        };
        self.nesting -= 1;
        result
    }

    fn comparison(&mut self) -> Result<Condition, CclError> {
        let field = self.field()?;
        let op_token = self.current().clone();
        let operator = match op_token.kind {
            TokenKind::Operator => Operator::parse(&op_token.text),
            _ => None,
        }
        .ok_or_else(|| {
            CclError::syntax(
                op_token.line,
                op_token.column,
                format!("expected comparison operator after '{field}', found {op_token}"),
            )
        })?;
        self.advance();

        let value_token = self.current().clone();
        let value = self.value()?;
        match (&value, operator.takes_list()) {
            (Value::List(_), false) => {
                return Err(CclError::syntax(
                    value_token.line,
                    value_token.column,
                    format!("list values are only valid with 'in' or 'not_in', not '{operator}'"),
                ));
            }
            (Value::List(_), true) => {}
            (_, true) => {
                return Err(CclError::syntax(
                    value_token.line,
                    value_token.column,
                    format!("operator '{operator}' requires a list value"),
                ));
            }
            (_, false) => {}
        }
        if let (Operator::Matches, Value::String(pattern)) = (operator, &value) {
            if let Err(e) = Regex::new(pattern) {
                return Err(CclError::syntax(
                    value_token.line,
                    value_token.column,
                    format!("invalid regular expression '{pattern}': {e}"),
                ));
            }
        }

        Ok(Condition::compare(field, operator, value))
    }

    fn field(&mut self) -> Result<String, CclError> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.error_here(format!(
                "expected condition field, found {}",
                self.current()
            )));
        }
        let mut field = self.advance().text;
        while self.at(TokenKind::Dot) {
            self.advance();
            let token = self.current();
            if !token.kind.is_word() {
                return Err(self.error_here(format!("expected field name after '.', found {token}")));
            }
            field.push('.');
            field.push_str(&self.advance().text);
        }
        Ok(field)
    }

    fn value(&mut self) -> Result<Value, CclError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::String => {
                self.advance();
                Ok(Value::String(token.text))
            }
            TokenKind::Number => {
                self.advance();
                token.text.parse::<f64>().map(Value::Number).map_err(|_| {
                    CclError::syntax(token.line, token.column, format!("invalid number '{}'", token.text))
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(match token.text.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::String(token.text),
                })
            }
            TokenKind::LBracket => self.list(),
            _ => Err(self.error_here(format!("expected value, found {token}"))),
        }
    }

    fn list(&mut self) -> Result<Value, CclError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();
        if self.at(TokenKind::RBracket) {
            self.advance();
            return Ok(Value::List(items));
        }
        loop {
            let item = self.expect(TokenKind::String, "string list item")?;
            items.push(item.text);
            if self.at(TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RBracket, "',' or ']' in list")?;
            return Ok(Value::List(items));
        }
    }
}
