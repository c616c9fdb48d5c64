//! FILENAME: core/parser/src/value.rs
//! PURPOSE: Typed scalar values shared by literals, query rows and evaluated cells.
//! CONTEXT: Literals in the AST carry a ScalarValue, the query runner returns
//! rows of ScalarValues, and the evaluator produces ScalarValues. Keeping the
//! type here lets every downstream crate agree on one representation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ScalarValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
}

/// The kind of a ScalarValue, without its payload.
/// Used when reporting type mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Null,
    Text,
    Number,
    Boolean,
    Date,
}

impl ScalarValue {
    pub fn text(s: impl Into<String>) -> Self {
        ScalarValue::Text(s.into())
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Null => ScalarKind::Null,
            ScalarValue::Text(_) => ScalarKind::Text,
            ScalarValue::Number(_) => ScalarKind::Number,
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
            ScalarValue::Date(_) => ScalarKind::Date,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Attempts to coerce the value to a number.
    /// Text is accepted when it parses as a number after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            ScalarValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            ScalarValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Plain text rendering used for concatenation.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Text(s) => write!(f, "{}", s),
            ScalarValue::Number(n) => {
                // Whole numbers print without a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            ScalarValue::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            ScalarValue::Date(d) => {
                if d.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", d.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScalarKind::Null => "null",
            ScalarKind::Text => "text",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
        };
        f.write_str(name)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(value: NaiveDateTime) -> Self {
        ScalarValue::Date(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ScalarValue::Null)
    }
}
