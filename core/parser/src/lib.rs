//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the report expression parser.
//! CONTEXT: This module exposes the lexer, parser, and AST components
//! needed to convert expression strings found in report definitions into
//! evaluatable expression trees, plus the ScalarValue type they produce.
//!
//! PIPELINE: Expression String --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, /
//! - String concatenation: &
//! - Field references: Fields!Amount.Value
//! - Parameter references: Parameters!Region.Value
//! - Functions: RowNumber("Dataset"), Lookup(...)
//! - Parentheses for grouping
//! - Unary negation: -5

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;


pub use ast::{BinaryOperator, Expression, LookupRef, UnaryOperator};
pub use lexer::Lexer;
pub use parser::{parse, parse_report_text, ParseError, ParseResult, Parser};
pub use token::{Spanned, Token};
pub use value::{ScalarKind, ScalarValue};
