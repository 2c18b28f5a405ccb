// lexer.rs — Turns CCL source text into a flat token stream.
//
// Newlines are significant (they separate statements) except inside
// parentheses or brackets, where a condition or list may span lines.
// Consecutive newlines collapse into one token, so blank lines vanish.
// Comments are kept as tokens, wherever they appear; the parser skips them.
//
// A bare `/path` resource ends at whitespace, a bracket, a comma, or a
// quote character, so no string token ever holds both kinds of quote.
//
// The lexer only fails on unterminated strings. Anything else it does not
// recognize becomes an `Unknown` token so the parser can report it with
// its exact position.

use crate::error::CclError;
use crate::token::{Token, TokenKind};

/// Tokenize CCL source. The returned stream always ends with an `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CclError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Open `(` / `[` count; newlines inside are not separators.
    depth: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, CclError> {
        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                '\n' => {
                    self.bump();
                    self.push_newline(line, column);
                }
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '#' => {
                    let text = self.take_while(|ch| ch != '\n');
                    self.push(TokenKind::Comment, text, line, column);
                }
                '\'' | '"' => self.string(c)?,
                '/' => {
                    let text = self.take_while(|ch| {
                        !ch.is_whitespace()
                            && !matches!(ch, '(' | ')' | '[' | ']' | ',' | '\'' | '"')
                    });
                    self.push(TokenKind::String, text, line, column);
                }
                '*' => {
                    self.bump();
                    if self.peek() == Some('*') {
                        self.bump();
                        self.push(TokenKind::DoubleWildcard, "**", line, column);
                    } else {
                        self.push(TokenKind::Wildcard, "*", line, column);
                    }
                }
                '-' if self.peek_at(1).is_some_and(|ch| ch.is_ascii_digit()) => self.number(),
                c if c.is_ascii_digit() => self.number(),
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.take_while(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-');
                    let kind = TokenKind::for_word(&word).unwrap_or(TokenKind::Identifier);
                    self.push(kind, word, line, column);
                }
                '=' => {
                    self.bump();
                    self.push(TokenKind::Operator, "=", line, column);
                }
                '!' | '<' | '>' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        self.push(TokenKind::Operator, format!("{c}="), line, column);
                    } else if c == '!' {
                        self.push(TokenKind::Unknown, "!", line, column);
                    } else {
                        self.push(TokenKind::Operator, c.to_string(), line, column);
                    }
                }
                '.' => self.punct(TokenKind::Dot, c),
                ',' => self.punct(TokenKind::Comma, c),
                '(' => {
                    self.depth += 1;
                    self.punct(TokenKind::LParen, c);
                }
                '[' => {
                    self.depth += 1;
                    self.punct(TokenKind::LBracket, c);
                }
                ')' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.punct(TokenKind::RParen, c);
                }
                ']' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.punct(TokenKind::RBracket, c);
                }
                other => self.punct(TokenKind::Unknown, other),
            }
        }

        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Eof, "", line, column);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, text, line, column));
    }

    fn punct(&mut self, kind: TokenKind, c: char) {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.push(kind, c.to_string(), line, column);
    }

    fn push_newline(&mut self, line: usize, column: usize) {
        if self.depth > 0 {
            return;
        }
        match self.tokens.last() {
            None => {}
            Some(t) if t.kind == TokenKind::Newline => {}
            Some(_) => self.push(TokenKind::Newline, "\n", line, column),
        }
    }

    fn string(&mut self, quote: char) -> Result<(), CclError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.bump();
                    self.push(TokenKind::String, text, line, column);
                    return Ok(());
                }
                Some('\n') | None => {
                    return Err(CclError::syntax(line, column, "unterminated string literal"));
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn number(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        text.push_str(&self.take_while(|ch| ch.is_ascii_digit()));
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|ch| ch.is_ascii_digit()) {
            text.push('.');
            self.bump();
            text.push_str(&self.take_while(|ch| ch.is_ascii_digit()));
        }
        self.push(TokenKind::Number, text, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn permit_statement_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("permit file.read on '/data'"),
            vec![Permit, Identifier, Dot, Identifier, On, String, Eof]
        );
    }

    #[test]
    fn double_wildcard_is_lexed_before_single() {
        use TokenKind::*;
        assert_eq!(
            kinds("a.**.* on **"),
            vec![Identifier, Dot, DoubleWildcard, Dot, Wildcard, On, DoubleWildcard, Eof]
        );
    }

    #[test]
    fn bare_path_is_a_string_token() {
        let tokens = tokenize("deny file.delete on /system/**").unwrap();
        assert_eq!(tokens[5].kind, TokenKind::String);
        assert_eq!(tokens[5].text, "/system/**");
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("permit a on '/x'\n  deny b on '/y'").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        let deny = tokens.iter().find(|t| t.kind == TokenKind::Deny).unwrap();
        assert_eq!((deny.line, deny.column), (2, 3));
        let path = tokens.iter().filter(|t| t.kind == TokenKind::String).nth(1).unwrap();
        assert_eq!((path.line, path.column), (2, 13));
    }

    #[test]
    fn blank_lines_collapse_and_comments_are_kept() {
        use TokenKind::*;
        assert_eq!(
            kinds("\n\n# header\n\n\npermit a on '/x'\n\n"),
            vec![Comment, Newline, Permit, Identifier, On, String, Newline, Eof]
        );
    }

    #[test]
    fn operators_and_word_operators() {
        let tokens = tokenize("a != 1 b <= 2 c >= 3 d < 4 e > 5 f = 6 g not_in h starts_with").unwrap();
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["!=", "<=", ">=", "<", ">", "=", "not_in", "starts_with"]);
    }

    #[test]
    fn not_is_keyword_but_not_in_is_operator() {
        use TokenKind::*;
        assert_eq!(kinds("not x not_in"), vec![Not, Identifier, Operator, Eof]);
    }

    #[test]
    fn numbers_with_sign_and_fraction() {
        let tokens = tokenize("-12 3.5 40").unwrap();
        let texts: Vec<&str> = tokens[..3].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["-12", "3.5", "40"]);
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn newlines_inside_parens_are_not_separators() {
        let tokens = tokenize("permit a on '/x' when (x = 1\n and y = 2)").unwrap();
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Newline));
    }

    #[test]
    fn unterminated_string_reports_its_start() {
        let err = tokenize("permit a on '/data\n").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.column(), Some(13));
        assert!(err.message().contains("unterminated"));
    }

    #[test]
    fn unknown_characters_become_unknown_tokens() {
        let tokens = tokenize("permit @").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
        assert_eq!(tokens[1].text, "@");
    }

    #[test]
    fn double_quoted_strings_are_accepted() {
        let tokens = tokenize("\"it's\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "it's");
    }

    #[test]
    fn bare_path_stops_at_quote_characters() {
        let tokens = tokenize("/x'y'").unwrap();
        assert_eq!(tokens[0].text, "/x");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text, "y");

        let err = tokenize("permit a on /x'y\"z").unwrap_err();
        assert!(err.message().contains("unterminated"));
        assert_eq!(err.column(), Some(15));
    }

    #[test]
    fn comments_inside_parens_are_kept_without_newlines() {
        use TokenKind::*;
        assert_eq!(
            kinds("(a # why\n b) # trailing"),
            vec![LParen, Identifier, Comment, Identifier, RParen, Comment, Eof]
        );
    }
}
