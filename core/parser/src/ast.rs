//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for report expressions.
//! CONTEXT: After the Lexer tokenizes an expression string, the Parser converts
//! those tokens into this tree structure. The engine's evaluator then
//! traverses this tree once per row to compute cell values.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: Numbers, Strings, Booleans, Nothing
//! - Field references: Fields!Amount.Value
//! - Parameter references: Parameters!StartDate.Value
//! - Row numbering: RowNumber("Orders")
//! - Cross-dataset lookup: Lookup(Fields!Sku.Value, "Bins", "Sku", "Bin")
//! - Binary operations: +, -, *, /, &
//! - Unary operations: - (negation)

use crate::value::ScalarValue;
use serde::{Deserialize, Serialize};

/// Represents a parsed report expression.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// A literal value. Text without a leading '=' also ends up here.
    Literal(ScalarValue),

    /// A reference to a field of the current row.
    /// `dataset` is None until the definition binds the expression to the
    /// dataset of its enclosing tablix.
    FieldRef {
        dataset: Option<String>,
        field: String,
    },

    /// A reference to a resolved report parameter.
    ParameterRef { name: String },

    /// The 1-based ordinal of the current row within a dataset.
    RowNumber { dataset: String },

    /// Resolves `key` against the current row, then returns `value_field`
    /// of the first row of `source_dataset` whose `key_field` matches.
    Lookup {
        key: Box<Expression>,
        source_dataset: String,
        key_field: String,
        value_field: String,
    },

    /// A binary operation: left op right.
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand (e.g., -5).
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

/// Binary operators for expressions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BinaryOperator {
    // String concatenation (lowest precedence)
    Concat, // &

    // Arithmetic operators
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        !matches!(self, BinaryOperator::Concat)
    }

    pub(crate) fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Concat => 1,
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            BinaryOperator::Multiply | BinaryOperator::Divide => 3,
        }
    }
}

/// Unary operators.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate, // -
}

/// A Lookup call site, as reported by `Expression::lookups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupRef<'a> {
    pub source_dataset: &'a str,
    pub key_field: &'a str,
    pub value_field: &'a str,
}

impl Expression {
    pub fn literal(value: impl Into<ScalarValue>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn field(field: impl Into<String>) -> Self {
        Expression::FieldRef {
            dataset: None,
            field: field.into(),
        }
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Expression::ParameterRef { name: name.into() }
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Returns true for expressions that are plain text (no leading '=').
    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal(_))
    }

    /// Calls `f` on this node and every node below it, parent first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expression)) {
        f(self);
        match self {
            Expression::Lookup { key, .. } => key.walk(f),
            Expression::BinaryOp { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Expression::UnaryOp { operand, .. } => operand.walk(f),
            Expression::Literal(_)
            | Expression::FieldRef { .. }
            | Expression::ParameterRef { .. }
            | Expression::RowNumber { .. } => {}
        }
    }

    /// All field references as (dataset, field) pairs, in source order.
    pub fn field_refs(&self) -> Vec<(Option<&str>, &str)> {
        let mut refs = Vec::new();
        self.walk(&mut |node| {
            if let Expression::FieldRef { dataset, field } = node {
                refs.push((dataset.as_deref(), field.as_str()));
            }
        });
        refs
    }

    /// Names of all referenced report parameters, in source order.
    pub fn parameter_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.walk(&mut |node| {
            if let Expression::ParameterRef { name } = node {
                refs.push(name.as_str());
            }
        });
        refs
    }

    /// All Lookup call sites, in source order.
    pub fn lookups(&self) -> Vec<LookupRef<'_>> {
        let mut refs = Vec::new();
        self.walk(&mut |node| {
            if let Expression::Lookup {
                source_dataset,
                key_field,
                value_field,
                ..
            } = node
            {
                refs.push(LookupRef {
                    source_dataset,
                    key_field,
                    value_field,
                });
            }
        });
        refs
    }

    /// Datasets named by `RowNumber` and `Lookup` calls, in source order.
    pub fn dataset_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.walk(&mut |node| match node {
            Expression::RowNumber { dataset } => refs.push(dataset.as_str()),
            Expression::Lookup { source_dataset, .. } => refs.push(source_dataset.as_str()),
            _ => {}
        });
        refs
    }

    /// Binds every unqualified field reference to `dataset`.
    pub fn qualify_fields(&mut self, dataset: &str) {
        match self {
            Expression::FieldRef { dataset: ds, .. } => {
                if ds.is_none() {
                    *ds = Some(dataset.to_string());
                }
            }
            Expression::Lookup { key, .. } => key.qualify_fields(dataset),
            Expression::BinaryOp { left, right, .. } => {
                left.qualify_fields(dataset);
                right.qualify_fields(dataset);
            }
            Expression::UnaryOp { operand, .. } => operand.qualify_fields(dataset),
            Expression::Literal(_) | Expression::ParameterRef { .. } | Expression::RowNumber { .. } => {}
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Concat => write!(f, "&"),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

fn write_quoted(f: &mut std::fmt::Formatter<'_>, s: &str) -> std::fmt::Result {
    write!(f, "\"{}\"", s.replace('"', "\"\""))
}

/// Prints the expression back in report surface syntax (without the leading '=').
impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(value) => match value {
                ScalarValue::Null => write!(f, "Nothing"),
                ScalarValue::Number(_) | ScalarValue::Boolean(_) => write!(f, "{}", value),
                ScalarValue::Text(s) => write_quoted(f, s),
                ScalarValue::Date(_) => write_quoted(f, &value.to_string()),
            },
            Expression::FieldRef { field, .. } => write!(f, "Fields!{}.Value", field),
            Expression::ParameterRef { name } => write!(f, "Parameters!{}.Value", name),
            Expression::RowNumber { dataset } => {
                write!(f, "RowNumber(")?;
                write_quoted(f, dataset)?;
                write!(f, ")")
            }
            Expression::Lookup {
                key,
                source_dataset,
                key_field,
                value_field,
            } => {
                write!(f, "Lookup({}, ", key)?;
                write_quoted(f, source_dataset)?;
                write!(f, ", ")?;
                write_quoted(f, key_field)?;
                write!(f, ", ")?;
                write_quoted(f, value_field)?;
                write!(f, ")")
            }
            Expression::BinaryOp { left, op, right } => {
                write_operand(f, left, op.precedence(), false)?;
                write!(f, " {} ", op)?;
                write_operand(f, right, op.precedence(), true)
            }
            Expression::UnaryOp { op, operand } => match operand.as_ref() {
                Expression::BinaryOp { .. } => write!(f, "{}({})", op, operand),
                _ => write!(f, "{}{}", op, operand),
            },
        }
    }
}

/// Writes a binary operand, parenthesizing when the operand binds looser
/// than its parent (or equally, on the right of a left-associative op).
fn write_operand(
    f: &mut std::fmt::Formatter<'_>,
    operand: &Expression,
    parent_precedence: u8,
    is_right: bool,
) -> std::fmt::Result {
    if let Expression::BinaryOp { op, .. } = operand {
        let p = op.precedence();
        if p < parent_precedence || (is_right && p == parent_precedence) {
            return write!(f, "({})", operand);
        }
    }
    write!(f, "{}", operand)
}
