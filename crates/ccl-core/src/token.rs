// token.rs — Token types produced by the lexer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The category of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    // Statement keywords
    Permit,
    Deny,
    Require,
    Limit,

    // Clause keywords
    On,
    When,
    Severity,
    Per,
    Seconds,

    // Boolean connectives
    And,
    Or,
    Not,

    /// Comparison or word operator (`=`, `<=`, `contains`, `not_in`, ...).
    Operator,

    // Literals
    Identifier,
    /// Quoted string, or a bare path starting with `/`. `text` holds the content.
    String,
    Number,

    Wildcard,
    DoubleWildcard,

    // Punctuation
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    Comment,
    Newline,
    /// A character outside the grammar; rejected by the parser.
    Unknown,
    Eof,
}

impl TokenKind {
    /// Keyword or word-operator kind for a bare word, if it is reserved.
    pub fn for_word(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "permit" => TokenKind::Permit,
            "deny" => TokenKind::Deny,
            "require" => TokenKind::Require,
            "limit" => TokenKind::Limit,
            "on" => TokenKind::On,
            "when" => TokenKind::When,
            "severity" => TokenKind::Severity,
            "per" => TokenKind::Per,
            "seconds" => TokenKind::Seconds,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "contains" | "not_contains" | "in" | "not_in" | "matches" | "starts_with"
            | "ends_with" => TokenKind::Operator,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a token of this kind is spelled as a plain word in the source.
    pub fn is_word(self) -> bool {
        matches!(
            self,
            TokenKind::Permit
                | TokenKind::Deny
                | TokenKind::Require
                | TokenKind::Limit
                | TokenKind::On
                | TokenKind::When
                | TokenKind::Severity
                | TokenKind::Per
                | TokenKind::Seconds
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::Identifier
        )
    }
}

/// A lexed token with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::String => write!(f, "string '{}'", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}
