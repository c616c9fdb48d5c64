//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Library root for the report execution engine.
//! CONTEXT: The engine sits between a parsed ReportDefinition and the
//! render projection. It resolves report parameters, runs dataset queries
//! through a caller-supplied QueryRunner, and evaluates every tablix
//! expression per row.
//!
//! PIPELINE: ReportDefinition + parameters --> ReportExecution --> QueryRunner
//!           --> RawRow --> Evaluator --> EvaluatedRow

pub mod config;
pub mod error;
pub mod evaluator;
pub mod execute;
pub mod lookup;
pub mod parameters;
pub mod query;
pub mod row;
pub mod runner;

pub use config::{EngineConfig, PlaceholderStyle};
pub use error::{EvalError, ExecError, RunnerError};
pub use evaluator::{evaluate, EvalContext, Evaluator, RowContext};
pub use execute::{execute, execute_with_config, ReportExecution};
pub use lookup::{ExecutionCache, LookupIndex, LookupKey};
pub use parameters::{resolve_parameters, ParameterValue, ParameterValues};
pub use query::{bind_query_parameters, rewrite_markers, BoundQuery};
pub use row::{EvaluatedCell, EvaluatedRow, RawRow};
pub use runner::{QueryRequest, QueryRunner};
