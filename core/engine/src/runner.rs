//! FILENAME: core/engine/src/runner.rs
//! PURPOSE: The boundary between the engine and whatever executes queries.
//! CONTEXT: The engine never opens a connection. It hands a rewritten
//! command plus bound values to a QueryRunner supplied by the caller and
//! receives rows of scalars back.

use crate::error::RunnerError;
use crate::row::RawRow;
use indexmap::IndexMap;
use parser::ScalarValue;
use rdl::DataSource;

/// One query to run.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    /// The datasource the dataset is bound to. Its reference tells the
    /// runner which connection to use.
    pub datasource: &'a DataSource,
    pub dataset: &'a str,
    /// Command text with markers already rewritten to placeholders.
    pub text: &'a str,
    /// Placeholder name -> value.
    pub params: &'a IndexMap<String, ScalarValue>,
}

/// Executes queries on behalf of the engine.
pub trait QueryRunner {
    fn run(&self, request: &QueryRequest<'_>) -> Result<Vec<RawRow>, RunnerError>;
}

impl<F> QueryRunner for F
where
    F: Fn(&QueryRequest<'_>) -> Result<Vec<RawRow>, RunnerError>,
{
    fn run(&self, request: &QueryRequest<'_>) -> Result<Vec<RawRow>, RunnerError> {
        self(request)
    }
}
