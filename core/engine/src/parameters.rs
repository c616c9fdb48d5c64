//! FILENAME: core/engine/src/parameters.rs
//! PURPOSE: Report parameter values and their resolution for one execution.
//! CONTEXT: User-supplied values win over defaults. Defaults are
//! expressions that may reference other parameters, so they are evaluated
//! in dependency order; a cycle among them is an error. Every value is then
//! coerced to the parameter's declared type.

use crate::config::EngineConfig;
use crate::error::ExecError;
use crate::evaluator::{evaluate, EvalContext};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use parser::ScalarValue;
use rdl::{ParameterDataType, ReportDefinition, ReportParameter};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The value of one report parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Single(ScalarValue),
    Multi(Vec<ScalarValue>),
}

impl ParameterValue {
    /// The value seen by expressions: the first of a multi-value list,
    /// Null when the list is empty.
    pub fn first(&self) -> ScalarValue {
        match self {
            ParameterValue::Single(v) => v.clone(),
            ParameterValue::Multi(values) => values.first().cloned().unwrap_or_default(),
        }
    }

    pub fn values(&self) -> Vec<ScalarValue> {
        match self {
            ParameterValue::Single(v) => vec![v.clone()],
            ParameterValue::Multi(values) => values.clone(),
        }
    }
}

macro_rules! single_from {
    ($($t:ty),*) => {
        $(impl From<$t> for ParameterValue {
            fn from(value: $t) -> Self {
                ParameterValue::Single(value.into())
            }
        })*
    };
}

single_from!(ScalarValue, f64, i64, bool, &str, String, NaiveDateTime);

impl From<Vec<ScalarValue>> for ParameterValue {
    fn from(values: Vec<ScalarValue>) -> Self {
        ParameterValue::Multi(values)
    }
}

/// Parameter name -> value, in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterValues {
    values: IndexMap<String, ParameterValue>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of `insert`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// The scalar an expression sees for `name`.
    pub fn scalar(&self, name: &str) -> Option<ScalarValue> {
        self.values.get(name).map(ParameterValue::first)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = ParameterValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolves every declared parameter of `definition`.
/// The result holds declared parameters only, in declaration order.
pub fn resolve_parameters(
    definition: &ReportDefinition,
    supplied: &ParameterValues,
    config: &EngineConfig,
) -> Result<ParameterValues, ExecError> {
    for (name, _) in supplied.iter() {
        if definition.parameter(name).is_none() {
            log::warn!(target: "PARAMS", "Ignoring value for undeclared parameter '{}'", name);
        }
    }

    let mut resolved = ParameterValues::new();
    for param in &definition.parameters {
        if let Some(value) = supplied.get(&param.name) {
            let value = coerce_value(param, value.clone(), config)?;
            resolved.insert(param.name.clone(), value);
        }
    }

    for param in default_order(definition, supplied)? {
        let value = evaluate_default(definition, param, &resolved)?;
        let value = coerce_value(param, value, config)?;
        log::debug!(target: "PARAMS", "Parameter '{}' defaulted to {:?}", param.name, value);
        resolved.insert(param.name.clone(), value);
    }

    // Restore declaration order
    let ordered = definition
        .parameters
        .iter()
        .filter_map(|p| resolved.get(&p.name).map(|v| (p.name.clone(), v.clone())))
        .collect();
    Ok(ordered)
}

/// Parameters without a supplied value, ordered so every default is
/// evaluated after the parameters it references.
fn default_order<'a>(
    definition: &'a ReportDefinition,
    supplied: &ParameterValues,
) -> Result<Vec<&'a ReportParameter>, ExecError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        param: &'a ReportParameter,
        definition: &'a ReportDefinition,
        supplied: &ParameterValues,
        marks: &mut FxHashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<&'a ReportParameter>,
    ) -> Result<(), ExecError> {
        match marks.get(param.name.as_str()) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == param.name).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(param.name.clone());
                return Err(ExecError::ParameterCycle(cycle));
            }
            None => {}
        }

        marks.insert(&param.name, Mark::Visiting);
        path.push(&param.name);

        if let Some(default) = &param.default_value {
            for dep in default.parameter_refs() {
                if supplied.contains(dep) {
                    continue;
                }
                // Undeclared references surface when the default is evaluated
                if let Some(dep_param) = definition.parameter(dep) {
                    visit(dep_param, definition, supplied, marks, path, order)?;
                }
            }
        }

        path.pop();
        marks.insert(&param.name, Mark::Done);
        order.push(param);
        Ok(())
    }

    let mut marks = FxHashMap::default();
    let mut path = Vec::new();
    let mut order = Vec::new();
    for param in &definition.parameters {
        if !supplied.contains(&param.name) {
            visit(param, definition, supplied, &mut marks, &mut path, &mut order)?;
        }
    }
    Ok(order)
}

fn evaluate_default(
    definition: &ReportDefinition,
    param: &ReportParameter,
    resolved: &ParameterValues,
) -> Result<ParameterValue, ExecError> {
    let value = match &param.default_value {
        Some(expr) => {
            let context = EvalContext::without_row(definition, resolved);
            evaluate(expr, &context).map_err(|cause| ExecError::ParameterEvaluation {
                name: param.name.clone(),
                cause,
            })?
        }
        None => ScalarValue::Null,
    };

    if param.multi_value {
        let values = if value.is_null() { Vec::new() } else { vec![value] };
        Ok(ParameterValue::Multi(values))
    } else {
        Ok(ParameterValue::Single(value))
    }
}

/// Coerces a value to the declared shape (single or multi) and type.
fn coerce_value(
    param: &ReportParameter,
    value: ParameterValue,
    config: &EngineConfig,
) -> Result<ParameterValue, ExecError> {
    let coerce = |v: ScalarValue| coerce_scalar(param, v, config);
    match (param.multi_value, value) {
        (true, ParameterValue::Multi(values)) => Ok(ParameterValue::Multi(
            values.into_iter().map(coerce).collect::<Result<_, _>>()?,
        )),
        (true, ParameterValue::Single(v)) => {
            let values = if v.is_null() { Vec::new() } else { vec![coerce(v)?] };
            Ok(ParameterValue::Multi(values))
        }
        (false, ParameterValue::Single(v)) => Ok(ParameterValue::Single(coerce(v)?)),
        (false, ParameterValue::Multi(values)) => {
            if values.len() > 1 {
                log::warn!(
                    target: "PARAMS",
                    "Parameter '{}' is single-valued; using the first of {} values",
                    param.name,
                    values.len()
                );
            }
            let first = values.into_iter().next().unwrap_or_default();
            Ok(ParameterValue::Single(coerce(first)?))
        }
    }
}

fn coerce_scalar(
    param: &ReportParameter,
    value: ScalarValue,
    config: &EngineConfig,
) -> Result<ScalarValue, ExecError> {
    let invalid = |value: &ScalarValue| ExecError::InvalidParameterValue {
        name: param.name.clone(),
        value: value.to_string(),
        data_type: param.data_type,
    };

    if value.is_null() {
        return Ok(ScalarValue::Null);
    }
    // Blank input means "no value" for every non-text type
    if let ScalarValue::Text(s) = &value {
        if s.trim().is_empty() && param.data_type != ParameterDataType::Text {
            return Ok(ScalarValue::Null);
        }
    }

    match param.data_type {
        ParameterDataType::Text => match value {
            ScalarValue::Text(_) => Ok(value),
            other => Ok(ScalarValue::Text(other.to_string())),
        },
        ParameterDataType::Integer => match value.as_number() {
            Some(n) if n.fract() == 0.0 => Ok(ScalarValue::Number(n)),
            _ => Err(invalid(&value)),
        },
        ParameterDataType::Float => value
            .as_number()
            .filter(|n| n.is_finite())
            .map(ScalarValue::Number)
            .ok_or_else(|| invalid(&value)),
        ParameterDataType::Boolean => match &value {
            ScalarValue::Boolean(_) => Ok(value),
            ScalarValue::Text(s) if s.trim().eq_ignore_ascii_case("true") => {
                Ok(ScalarValue::Boolean(true))
            }
            ScalarValue::Text(s) if s.trim().eq_ignore_ascii_case("false") => {
                Ok(ScalarValue::Boolean(false))
            }
            _ => Err(invalid(&value)),
        },
        ParameterDataType::DateTime => match &value {
            ScalarValue::Date(_) => Ok(value),
            ScalarValue::Text(s) => config
                .parse_date(s)
                .map(ScalarValue::Date)
                .ok_or_else(|| invalid(&value)),
            _ => Err(invalid(&value)),
        },
    }
}
