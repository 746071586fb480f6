use std::fmt;

use crate::ecs::value::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Component,
    System,
    Event,
    If,
    Else,
    While,
    Pass,
    True,
    False,
}

impl Keyword {
    pub const ALL: [Keyword; 9] = [
        Keyword::Component,
        Keyword::System,
        Keyword::Event,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::Pass,
        Keyword::True,
        Keyword::False,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Keyword::Component => "component",
            Keyword::System => "system",
            Keyword::Event => "event",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Pass => "pass",
            Keyword::True => "true",
            Keyword::False => "false",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|keyword| keyword.as_str() == identifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword(Keyword),
    Number,
    Integer,
    String,
    Operator(Operator),
    Assign,
    OpenParen,
    CloseParen,
    Comma,
    Dot,
    Colon,
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Whether a token of this kind can end an operand. A `-` after one is a binary minus.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::Integer
                | TokenKind::String
                | TokenKind::CloseParen
                | TokenKind::Keyword(Keyword::True | Keyword::False)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => f.write_str("identifier"),
            TokenKind::Keyword(keyword) => write!(f, "`{}`", keyword.as_str()),
            TokenKind::Number => f.write_str("number"),
            TokenKind::Integer => f.write_str("integer"),
            TokenKind::String => f.write_str("string"),
            TokenKind::Operator(operator) => write!(f, "`{operator}`"),
            TokenKind::Assign => f.write_str("`=`"),
            TokenKind::OpenParen => f.write_str("`(`"),
            TokenKind::CloseParen => f.write_str("`)`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Dot => f.write_str("`.`"),
            TokenKind::Colon => f.write_str("`:`"),
            TokenKind::Newline => f.write_str("end of line"),
            TokenKind::Indent => f.write_str("indent"),
            TokenKind::Dedent => f.write_str("dedent"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

/// A token and where it starts. Lines and columns count from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text, with string literals unescaped and unquoted.
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

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::Integer => {
                format!("{} `{}`", self.kind, self.text)
            }
            TokenKind::String => format!("string \"{}\"", self.text),
            _ => self.kind.to_string(),
        }
    }
}
