//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Builds an Expression tree from the lexer's token stream.
//! CONTEXT: Binary operators are handled by precedence climbing, with
//! levels taken from `BinaryOperator::precedence` (`&` loosest, then
//! `+ -`, then `* /`). Everything tighter than that is a primary:
//!
//!   primary    --> "-" primary | NUMBER | STRING | TRUE | FALSE | NOTHING
//!                | Collection "!" Name "." "Value"
//!                | RowNumber "(" STRING ")"
//!                | Lookup "(" expr "," lookup_tail ")"
//!                | "(" expr ")"
//!   lookup_tail --> STRING "," STRING "," STRING
//!                | field "," field "," STRING
//!
//! Keywords are case-insensitive. Both Lookup spellings produce the same
//! node; the second is what report designers write.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::{Spanned, Token};
use crate::value::ScalarValue;
use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Error)]
#[error("Parse error at offset {offset}: {message}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the source text.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            message: message.into(),
            offset,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Collections addressable with `Name!Member.Value`.
#[derive(Clone, Copy)]
enum Collection {
    Fields,
    Parameters,
}

impl Collection {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("Fields") {
            Some(Collection::Fields)
        } else if name.eq_ignore_ascii_case("Parameters") {
            Some(Collection::Parameters)
        } else {
            None
        }
    }

    fn reference(self, member: String) -> Expression {
        match self {
            Collection::Fields => Expression::FieldRef {
                dataset: None,
                field: member,
            },
            Collection::Parameters => Expression::ParameterRef { name: member },
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_spanned();
        Parser { lexer, current }
    }

    /// Parses the whole input. A single leading `=` is skipped.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current.token == Token::Equals {
            self.bump();
        }
        if self.current.token == Token::End {
            return Err(self.error("Empty expression"));
        }

        let expr = self.expression(0)?;
        match self.current.token {
            Token::End => Ok(expr),
            ref other => Err(self.error(format!("Unexpected token after expression: {}", other))),
        }
    }

    /// Takes the current token and moves to the next one.
    fn bump(&mut self) -> Spanned {
        let next = self.lexer.next_spanned();
        std::mem::replace(&mut self.current, next)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current.offset)
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        self.error(format!("Expected {}, found {}", wanted, self.current.token))
    }

    fn eat(&mut self, token: &Token) -> ParseResult<()> {
        if &self.current.token == token {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.current.token.is_name(keyword) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn name(&mut self) -> ParseResult<String> {
        match self.current.token {
            Token::Name(ref mut n) => {
                let n = std::mem::take(n);
                self.bump();
                Ok(n)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn quoted(&mut self, what: &str) -> ParseResult<String> {
        match self.current.token {
            Token::Text(ref mut s) => {
                let s = std::mem::take(s);
                self.bump();
                Ok(s)
            }
            _ => Err(self.unexpected(&format!("quoted {}", what))),
        }
    }

    fn binary_operator(&self) -> Option<BinaryOperator> {
        match self.current.token {
            Token::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Parses operands joined by operators binding tighter than `min`.
    /// All operators are left-associative.
    fn expression(&mut self, min: u8) -> ParseResult<Expression> {
        let mut left = self.primary()?;
        while let Some(op) = self.binary_operator() {
            let precedence = op.precedence();
            if precedence <= min {
                break;
            }
            self.bump();
            let right = self.expression(precedence)?;
            left = Expression::binary(left, op, right);
        }
        Ok(left)
    }

    fn primary(&mut self) -> ParseResult<Expression> {
        let start = self.current.offset;
        match self.bump().token {
            Token::Operator(BinaryOperator::Subtract) => Ok(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(self.primary()?),
            }),
            Token::Number(n) => Ok(Expression::Literal(ScalarValue::Number(n))),
            Token::Text(s) => Ok(Expression::Literal(ScalarValue::Text(s))),
            Token::OpenParen => {
                let inner = self.expression(0)?;
                self.eat(&Token::CloseParen)?;
                Ok(inner)
            }
            Token::Name(name) => match self.current.token {
                Token::Bang => {
                    self.bump();
                    self.collection_member(&name, start)
                }
                Token::OpenParen => {
                    self.bump();
                    self.call(&name, start)
                }
                _ => keyword_literal(&name)
                    .ok_or_else(|| ParseError::new(format!("Unknown identifier: {}", name), start)),
            },
            Token::UnterminatedText => Err(ParseError::new("Unterminated string literal", start)),
            Token::End => Err(ParseError::new("Unexpected end of expression", start)),
            other => Err(ParseError::new(format!("Unexpected token: {}", other), start)),
        }
    }

    /// `Member.Value` after `Collection!`.
    fn collection_member(&mut self, collection: &str, start: usize) -> ParseResult<Expression> {
        let kind = Collection::from_name(collection).ok_or_else(|| {
            ParseError::new(format!("Unsupported collection: {}", collection), start)
        })?;
        let member = self.name()?;
        self.eat(&Token::Dot)?;
        self.eat_keyword("Value")?;
        Ok(kind.reference(member))
    }

    /// Function arguments after the opening parenthesis.
    fn call(&mut self, function: &str, start: usize) -> ParseResult<Expression> {
        if function.eq_ignore_ascii_case("RowNumber") {
            let dataset = self.quoted("dataset name")?;
            self.eat(&Token::CloseParen)?;
            Ok(Expression::RowNumber { dataset })
        } else if function.eq_ignore_ascii_case("Lookup") {
            self.lookup()
        } else {
            Err(ParseError::new(format!("Unsupported function: {}", function), start))
        }
    }

    fn lookup(&mut self) -> ParseResult<Expression> {
        let key = Box::new(self.expression(0)?);
        self.eat(&Token::Comma)?;

        let (source_dataset, key_field, value_field) = if matches!(self.current.token, Token::Text(_)) {
            let dataset = self.quoted("dataset name")?;
            self.eat(&Token::Comma)?;
            let key_field = self.quoted("key field")?;
            self.eat(&Token::Comma)?;
            (dataset, key_field, self.quoted("value field")?)
        } else {
            let key_field = self.lookup_field("destination")?;
            self.eat(&Token::Comma)?;
            let value_field = self.lookup_field("result")?;
            self.eat(&Token::Comma)?;
            (self.quoted("dataset name")?, key_field, value_field)
        };
        self.eat(&Token::CloseParen)?;

        Ok(Expression::Lookup {
            key,
            source_dataset,
            key_field,
            value_field,
        })
    }

    fn lookup_field(&mut self, role: &str) -> ParseResult<String> {
        let start = self.current.offset;
        match self.expression(0)? {
            Expression::FieldRef { field, .. } => Ok(field),
            other => Err(ParseError::new(
                format!("Lookup {} argument must be a field reference, found {}", role, other),
                start,
            )),
        }
    }
}

fn keyword_literal(word: &str) -> Option<Expression> {
    let value = match word.to_ascii_lowercase().as_str() {
        "true" => ScalarValue::Boolean(true),
        "false" => ScalarValue::Boolean(false),
        "nothing" => ScalarValue::Null,
        _ => return None,
    };
    Some(Expression::Literal(value))
}

/// Parses an expression string. A leading '=' is accepted and ignored.
pub fn parse(input: &str) -> ParseResult<Expression> {
    Parser::new(input).parse()
}

/// Report text convention: text starting with '=' is an expression,
/// anything else is a literal string kept verbatim.
pub fn parse_report_text(text: &str) -> ParseResult<Expression> {
    if text.starts_with('=') {
        parse(text)
    } else {
        Ok(Expression::Literal(ScalarValue::Text(text.to_string())))
    }
}
