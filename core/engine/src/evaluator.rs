//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: Evaluates report expressions against one row context.
//! CONTEXT: The execution bridge builds an EvalContext per row (home
//! dataset, current fields, ordinal, resolved parameters, prepared Lookup
//! indices) and evaluates every column expression through it. Parameter
//! defaults are evaluated through the same code with no row at all.
//!
//! SUPPORTED FEATURES:
//! - Field references into the home dataset
//! - Parameter references (first value of a multi-value parameter)
//! - RowNumber over the current dataset
//! - Lookup through a prepared per-execution index
//! - Arithmetic with null propagation, date shifting, text concatenation

use crate::error::EvalError;
use crate::lookup::ExecutionCache;
use crate::parameters::ParameterValues;
use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use parser::{BinaryOperator, Expression, ScalarValue, UnaryOperator};
use rdl::{DataSet, ReportDefinition};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Largest day offset accepted by date arithmetic (~270k years).
const MAX_DAY_SHIFT: f64 = 1.0e8;

/// The current row of the home dataset.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub dataset: &'a DataSet,
    pub fields: &'a IndexMap<String, ScalarValue>,
    /// 1-based position within the dataset's result.
    pub ordinal: usize,
}

/// Everything an expression may read while being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub definition: &'a ReportDefinition,
    pub row: Option<RowContext<'a>>,
    pub parameters: &'a ParameterValues,
    pub lookups: Option<&'a ExecutionCache>,
}

impl<'a> EvalContext<'a> {
    /// Context for one row of `dataset`.
    pub fn for_row(
        definition: &'a ReportDefinition,
        dataset: &'a DataSet,
        fields: &'a IndexMap<String, ScalarValue>,
        ordinal: usize,
        parameters: &'a ParameterValues,
        lookups: &'a ExecutionCache,
    ) -> Self {
        EvalContext {
            definition,
            row: Some(RowContext {
                dataset,
                fields,
                ordinal,
            }),
            parameters,
            lookups: Some(lookups),
        }
    }

    /// Context with no current row, used for parameter defaults and
    /// query parameter bindings.
    pub fn without_row(definition: &'a ReportDefinition, parameters: &'a ParameterValues) -> Self {
        EvalContext {
            definition,
            row: None,
            parameters,
            lookups: None,
        }
    }
}

/// Evaluates `expr` in `context`.
pub fn evaluate(expr: &Expression, context: &EvalContext<'_>) -> Result<ScalarValue, EvalError> {
    Evaluator::new(*context).evaluate(expr)
}

/// The Evaluator walks an expression tree for a fixed context.
pub struct Evaluator<'a> {
    context: EvalContext<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: EvalContext<'a>) -> Self {
        Evaluator { context }
    }

    /// Evaluates an expression and returns the result.
    pub fn evaluate(&self, expr: &Expression) -> Result<ScalarValue, EvalError> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::FieldRef { dataset, field } => self.eval_field_ref(dataset.as_deref(), field),
            Expression::ParameterRef { name } => self.eval_parameter_ref(name),
            Expression::RowNumber { dataset } => self.eval_row_number(dataset),
            Expression::Lookup {
                key,
                source_dataset,
                key_field,
                value_field,
            } => self.eval_lookup(key, source_dataset, key_field, value_field),
            Expression::BinaryOp { left, op, right } => self.eval_binary_op(left, *op, right),
            Expression::UnaryOp { op, operand } => self.eval_unary_op(*op, operand),
        }
    }

    fn declared_dataset(&self, name: &str) -> Result<&'a DataSet, EvalError> {
        self.context
            .definition
            .dataset(name)
            .ok_or_else(|| EvalError::UnknownDataset(name.to_string()))
    }

    fn eval_field_ref(&self, dataset: Option<&str>, field: &str) -> Result<ScalarValue, EvalError> {
        let row = self.context.row.ok_or_else(|| EvalError::NoRowContext {
            reference: format!("Fields!{}.Value", field),
        })?;
        let home = row.dataset.name.as_str();

        if let Some(target) = dataset {
            if target != home {
                return Err(EvalError::CrossDatasetFieldAccess {
                    home: home.to_string(),
                    dataset: target.to_string(),
                    field: field.to_string(),
                });
            }
        }

        if row.dataset.field(field).is_none() {
            return Err(EvalError::UnknownField {
                dataset: home.to_string(),
                field: field.to_string(),
            });
        }

        Ok(row.fields.get(field).cloned().unwrap_or_default())
    }

    fn eval_parameter_ref(&self, name: &str) -> Result<ScalarValue, EvalError> {
        self.context
            .parameters
            .scalar(name)
            .ok_or_else(|| EvalError::UnknownParameter(name.to_string()))
    }

    fn eval_row_number(&self, dataset: &str) -> Result<ScalarValue, EvalError> {
        self.declared_dataset(dataset)?;
        let row = self.context.row.ok_or_else(|| EvalError::NoRowContext {
            reference: format!("RowNumber(\"{}\")", dataset),
        })?;
        Ok(ScalarValue::Number(row.ordinal as f64))
    }

    fn eval_lookup(
        &self,
        key: &Expression,
        source_dataset: &str,
        key_field: &str,
        value_field: &str,
    ) -> Result<ScalarValue, EvalError> {
        let source = self.declared_dataset(source_dataset)?;
        for field in [key_field, value_field] {
            if source.field(field).is_none() {
                return Err(EvalError::UnknownField {
                    dataset: source_dataset.to_string(),
                    field: field.to_string(),
                });
            }
        }

        let key_value = self.evaluate(key)?;
        if key_value.is_null() {
            return Ok(ScalarValue::Null);
        }

        let matched = self
            .context
            .lookups
            .and_then(|cache| cache.lookup(source_dataset, key_field, &key_value))
            .ok_or_else(|| EvalError::LookupNotPrepared {
                dataset: source_dataset.to_string(),
                key_field: key_field.to_string(),
            })?;

        Ok(matched
            .and_then(|row| row.field(value_field).cloned())
            .unwrap_or_default())
    }

    fn eval_binary_op(
        &self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
    ) -> Result<ScalarValue, EvalError> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op {
            BinaryOperator::Concat => Ok(ScalarValue::Text(format!("{}{}", left_val, right_val))),
            // SQL-style null propagation for arithmetic
            _ if left_val.is_null() || right_val.is_null() => Ok(ScalarValue::Null),
            BinaryOperator::Add => eval_add(&left_val, &right_val),
            BinaryOperator::Subtract => eval_subtract(&left_val, &right_val),
            BinaryOperator::Multiply => {
                let (a, b) = numeric_operands(op, &left_val, &right_val)?;
                Ok(ScalarValue::Number(a * b))
            }
            BinaryOperator::Divide => {
                let (a, b) = numeric_operands(op, &left_val, &right_val)?;
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(ScalarValue::Number(a / b))
            }
        }
    }

    fn eval_unary_op(&self, op: UnaryOperator, operand: &Expression) -> Result<ScalarValue, EvalError> {
        let value = self.evaluate(operand)?;
        match op {
            UnaryOperator::Negate => {
                if value.is_null() {
                    return Ok(ScalarValue::Null);
                }
                value
                    .as_number()
                    .map(|n| ScalarValue::Number(-n))
                    .ok_or_else(|| EvalError::TypeMismatch {
                        op: op.to_string(),
                        left: value.kind(),
                        right: None,
                    })
            }
        }
    }
}

fn mismatch(op: BinaryOperator, left: &ScalarValue, right: &ScalarValue) -> EvalError {
    EvalError::TypeMismatch {
        op: op.to_string(),
        left: left.kind(),
        right: Some(right.kind()),
    }
}

fn numeric_operands(
    op: BinaryOperator,
    left: &ScalarValue,
    right: &ScalarValue,
) -> Result<(f64, f64), EvalError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn shift_days(date: NaiveDateTime, days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() || days.abs() > MAX_DAY_SHIFT {
        return None;
    }
    let millis = (days * MILLIS_PER_DAY).round() as i64;
    date.checked_add_signed(Duration::milliseconds(millis))
}

fn eval_add(left: &ScalarValue, right: &ScalarValue) -> Result<ScalarValue, EvalError> {
    let op = BinaryOperator::Add;
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(ScalarValue::Number(a + b));
    }

    match (left, right) {
        (ScalarValue::Date(d), other) | (other, ScalarValue::Date(d)) => {
            let days = other.as_number().ok_or_else(|| mismatch(op, left, right))?;
            shift_days(*d, days)
                .map(ScalarValue::Date)
                .ok_or_else(|| mismatch(op, left, right))
        }
        (ScalarValue::Text(a), ScalarValue::Text(b)) => Ok(ScalarValue::Text(format!("{}{}", a, b))),
        _ => Err(mismatch(op, left, right)),
    }
}

fn eval_subtract(left: &ScalarValue, right: &ScalarValue) -> Result<ScalarValue, EvalError> {
    let op = BinaryOperator::Subtract;
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(ScalarValue::Number(a - b));
    }

    match (left, right) {
        (ScalarValue::Date(a), ScalarValue::Date(b)) => {
            let millis = a.signed_duration_since(*b).num_milliseconds();
            Ok(ScalarValue::Number(millis as f64 / MILLIS_PER_DAY))
        }
        (ScalarValue::Date(d), other) => {
            let days = other.as_number().ok_or_else(|| mismatch(op, left, right))?;
            shift_days(*d, -days)
                .map(ScalarValue::Date)
                .ok_or_else(|| mismatch(op, left, right))
        }
        _ => Err(mismatch(op, left, right)),
    }
}
