//! FILENAME: core/engine/src/error.rs

use parser::ScalarKind;
use rdl::ParameterDataType;
use thiserror::Error;

/// Error raised by a query runner. Opaque to the engine.
pub type RunnerError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to evaluate one expression against one row context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Unknown field '{field}' in dataset '{dataset}'")]
    UnknownField { dataset: String, field: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Field '{field}' of dataset '{dataset}' cannot be read from a row of '{home}'; use Lookup")]
    CrossDatasetFieldAccess {
        home: String,
        dataset: String,
        field: String,
    },

    #[error("{reference} needs a current row, but none is available")]
    NoRowContext { reference: String },

    #[error("Lookup into '{dataset}' by '{key_field}' is not available in this context")]
    LookupNotPrepared { dataset: String, key_field: String },

    #[error("Type mismatch: cannot apply '{op}' to {}", describe_operands(.left, .right))]
    TypeMismatch {
        op: String,
        left: ScalarKind,
        /// None for unary operators.
        right: Option<ScalarKind>,
    },

    #[error("Division by zero")]
    DivisionByZero,
}

fn describe_operands(left: &ScalarKind, right: &Option<ScalarKind>) -> String {
    match right {
        Some(right) => format!("{} and {}", left, right),
        None => left.to_string(),
    }
}

/// Failure of a dataset execution.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Unknown tablix: {0}")]
    UnknownTablix(String),

    #[error("Dataset '{dataset}' names undeclared datasource '{datasource}'")]
    UnknownDatasource { dataset: String, datasource: String },

    #[error("Query marker @{0} has no matching query parameter")]
    UnboundParameter(String),

    #[error("Parameter defaults form a cycle: {}", .0.join(" -> "))]
    ParameterCycle(Vec<String>),

    #[error("Default value of parameter '{name}' could not be evaluated: {cause}")]
    ParameterEvaluation {
        name: String,
        #[source]
        cause: EvalError,
    },

    #[error("Value '{value}' is not a valid {data_type:?} for parameter '{name}'")]
    InvalidParameterValue {
        name: String,
        value: String,
        data_type: ParameterDataType,
    },

    #[error("Query parameter '{name}' of dataset '{dataset}' could not be evaluated: {cause}")]
    QueryParameterEvaluation {
        dataset: String,
        name: String,
        #[source]
        cause: EvalError,
    },

    #[error("Query for dataset '{dataset}' failed: {source}")]
    QueryFailed {
        dataset: String,
        #[source]
        source: RunnerError,
    },

    #[error("Row {row_index} of dataset '{dataset}', column '{column}' ({expression}): {cause}")]
    RowEvaluationFailed {
        dataset: String,
        row_index: usize,
        column: String,
        expression: String,
        #[source]
        cause: EvalError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_names_operator_and_kinds() {
        let err = EvalError::TypeMismatch {
            op: "-".to_string(),
            left: ScalarKind::Text,
            right: Some(ScalarKind::Boolean),
        };
        assert_eq!(err.to_string(), "Type mismatch: cannot apply '-' to text and boolean");
    }

    #[test]
    fn unary_type_mismatch_names_single_kind() {
        let err = EvalError::TypeMismatch {
            op: "-".to_string(),
            left: ScalarKind::Date,
            right: None,
        };
        assert_eq!(err.to_string(), "Type mismatch: cannot apply '-' to date");
    }

    #[test]
    fn cycle_lists_members_in_order() {
        let err = ExecError::ParameterCycle(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(err.to_string(), "Parameter defaults form a cycle: A -> B -> A");
    }

    #[test]
    fn query_failure_keeps_runner_error_as_source() {
        let source: RunnerError = "connection reset".into();
        let err = ExecError::QueryFailed {
            dataset: "Orders".to_string(),
            source,
        };
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "connection reset");
    }
}
