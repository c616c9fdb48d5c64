//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Token definitions for the report expression lexer.
//! CONTEXT: Every token is paired with the byte offset it starts at so
//! parse errors can point into the source text.

use crate::ast::BinaryOperator;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Number(f64),
    /// Double-quoted literal with `""` escapes already collapsed.
    Text(String),
    /// Bare word: a collection, a function, a property or a keyword.
    Name(String),
    /// Any of `+ - * / &`. Minus doubles as unary negation.
    Operator(BinaryOperator),
    /// Leading expression marker.
    Equals,
    /// `!` between a collection and its member.
    Bang,
    /// `.` between a member and its property.
    Dot,
    Comma,
    OpenParen,
    CloseParen,
    /// A string literal that ran to the end of input.
    UnterminatedText,
    Unexpected(char),
    End,
}

/// A token and the byte offset of its first character.
#[derive(Debug, PartialEq, Clone)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

impl Token {
    /// Shorthand for `Token::Name` comparisons in tests and the parser.
    pub fn name(s: impl Into<String>) -> Self {
        Token::Name(s.into())
    }

    pub fn is_name(&self, keyword: &str) -> bool {
        matches!(self, Token::Name(n) if n.eq_ignore_ascii_case(keyword))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Token::Name(s) => f.write_str(s),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Equals => f.write_str("="),
            Token::Bang => f.write_str("!"),
            Token::Dot => f.write_str("."),
            Token::Comma => f.write_str(","),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::UnterminatedText => f.write_str("unterminated string"),
            Token::Unexpected(c) => write!(f, "'{}'", c),
            Token::End => f.write_str("end of expression"),
        }
    }
}
