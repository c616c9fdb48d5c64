//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Splits a report expression into positioned tokens.
//! CONTEXT: The lexer walks the source by byte offset and slices words and
//! numbers straight out of it. Only string literals allocate while
//! scanning, because `""` escapes have to be collapsed.

use crate::ast::BinaryOperator;
use crate::token::{Spanned, Token};

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    /// Byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Returns the next token without its position.
    pub fn next_token(&mut self) -> Token {
        self.next_spanned().token
    }

    pub fn next_spanned(&mut self) -> Spanned {
        self.pos += leading_whitespace(self.rest());
        let offset = self.pos;

        let Some(ch) = self.peek() else {
            return Spanned { token: Token::End, offset };
        };

        let token = if let Some(op) = operator_for(ch) {
            self.bump(ch);
            Token::Operator(op)
        } else {
            match ch {
                '"' => self.text_literal(),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.rest()[1..].starts_with(|c: char| c.is_ascii_digit()) => self.number(),
                c if starts_name(c) => self.word(),
                other => {
                    self.bump(other);
                    match other {
                        '=' => Token::Equals,
                        '!' => Token::Bang,
                        '.' => Token::Dot,
                        ',' => Token::Comma,
                        '(' => Token::OpenParen,
                        ')' => Token::CloseParen,
                        _ => Token::Unexpected(other),
                    }
                }
            }
        };

        Spanned { token, offset }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    /// Digits with at most one decimal point.
    fn number(&mut self) -> Token {
        let rest = self.rest();
        let mut seen_dot = false;
        let len = rest
            .char_indices()
            .find(|&(_, c)| {
                if c == '.' && !seen_dot {
                    seen_dot = true;
                    false
                } else {
                    !c.is_ascii_digit()
                }
            })
            .map_or(rest.len(), |(i, _)| i);

        let digits = &rest[..len];
        self.pos += len;
        match digits.parse::<f64>() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Unexpected('.'),
        }
    }

    fn word(&mut self) -> Token {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !continues_name(c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        Token::Name(rest[..len].to_string())
    }

    /// Reads from the opening quote through the closing one.
    fn text_literal(&mut self) -> Token {
        self.pos += 1;
        let mut text = String::new();
        loop {
            let rest = self.rest();
            let Some(quote) = rest.find('"') else {
                self.pos = self.src.len();
                return Token::UnterminatedText;
            };
            text.push_str(&rest[..quote]);
            self.pos += quote + 1;
            if self.rest().starts_with('"') {
                text.push('"');
                self.pos += 1;
            } else {
                return Token::Text(text);
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Spanned;

    /// Yields tokens up to, but not including, `Token::End`.
    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.next_spanned();
        (spanned.token != Token::End).then_some(spanned)
    }
}

fn operator_for(ch: char) -> Option<BinaryOperator> {
    Some(match ch {
        '+' => BinaryOperator::Add,
        '-' => BinaryOperator::Subtract,
        '*' => BinaryOperator::Multiply,
        '/' => BinaryOperator::Divide,
        '&' => BinaryOperator::Concat,
        _ => return None,
    })
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn starts_name(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn continues_name(c: char) -> bool {
    starts_name(c) || c.is_ascii_digit()
}
