//! FILENAME: core/engine/src/execute.rs
//! PURPOSE: The execution bridge: runs datasets and evaluates their rows.
//! CONTEXT: A ReportExecution is one run of one report. It resolves the
//! report parameters once, then executes datasets on demand: bind query
//! parameters, rewrite markers, call the query runner, and evaluate every
//! tablix column bound to the dataset for each returned row.
//!
//! Lookup sources are only fetched: their query runs once and the declared
//! fields are read, but none of their tablix cells are evaluated. A Lookup
//! needs nothing more, so a dataset may look up into itself or into a
//! dataset that looks back without any ordering problem. Fetched rows stay
//! cached for the session and are reused if the source is rendered later.
//! The session is single-threaded and owns all mutable state.

use crate::config::EngineConfig;
use crate::error::ExecError;
use crate::evaluator::{evaluate, EvalContext};
use crate::lookup::ExecutionCache;
use crate::parameters::{resolve_parameters, ParameterValues};
use crate::query::{bind_query_parameters, rewrite_markers};
use crate::row::{EvaluatedCell, EvaluatedRow, RawRow};
use crate::runner::{QueryRequest, QueryRunner};
use indexmap::IndexMap;
use parser::{Expression, ScalarValue};
use rdl::{Column, DataSet, ReportDefinition, Tablix};

/// Executes `dataset_name` with the default configuration.
pub fn execute(
    definition: &ReportDefinition,
    dataset_name: &str,
    user_parameters: &ParameterValues,
    runner: &dyn QueryRunner,
) -> Result<Vec<EvaluatedRow>, ExecError> {
    execute_with_config(
        definition,
        dataset_name,
        user_parameters,
        runner,
        &EngineConfig::default(),
    )
}

pub fn execute_with_config(
    definition: &ReportDefinition,
    dataset_name: &str,
    user_parameters: &ParameterValues,
    runner: &dyn QueryRunner,
    config: &EngineConfig,
) -> Result<Vec<EvaluatedRow>, ExecError> {
    if !definition.has_dataset(dataset_name) {
        return Err(ExecError::UnknownDataset(dataset_name.to_string()));
    }
    let mut session = ReportExecution::new(definition, user_parameters, runner, config)?;
    Ok(session.rows(dataset_name)?.to_vec())
}

/// One execution of one report.
pub struct ReportExecution<'a> {
    definition: &'a ReportDefinition,
    runner: &'a dyn QueryRunner,
    config: &'a EngineConfig,
    parameters: ParameterValues,
    cache: ExecutionCache,
}

impl<'a> ReportExecution<'a> {
    /// Starts a session. Report parameters are resolved here, once.
    pub fn new(
        definition: &'a ReportDefinition,
        user_parameters: &ParameterValues,
        runner: &'a dyn QueryRunner,
        config: &'a EngineConfig,
    ) -> Result<Self, ExecError> {
        let parameters = resolve_parameters(definition, user_parameters, config)?;
        log::debug!(target: "EXEC", "Resolved {} report parameters", parameters.len());
        Ok(ReportExecution {
            definition,
            runner,
            config,
            parameters,
            cache: ExecutionCache::new(),
        })
    }

    pub fn definition(&self) -> &'a ReportDefinition {
        self.definition
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// The resolved report parameters.
    pub fn parameters(&self) -> &ParameterValues {
        &self.parameters
    }

    /// Evaluated rows of `dataset`, executing it on first use.
    pub fn rows(&mut self, dataset: &str) -> Result<&[EvaluatedRow], ExecError> {
        self.ensure_evaluated(dataset)?;
        self.cache
            .evaluated(dataset)
            .ok_or_else(|| ExecError::UnknownDataset(dataset.to_string()))
    }

    /// Runs the query of `dataset` once per session and keeps its field rows.
    fn ensure_fetched(&mut self, dataset: &DataSet) -> Result<(), ExecError> {
        if self.cache.rows(&dataset.name).is_some() {
            return Ok(());
        }
        let rows = self
            .run_query(dataset)?
            .iter()
            .enumerate()
            .map(|(index, raw)| EvaluatedRow::new(index + 1, read_fields(dataset, raw)))
            .collect();
        self.cache.store_rows(&dataset.name, rows);
        Ok(())
    }

    fn ensure_evaluated(&mut self, name: &str) -> Result<(), ExecError> {
        if self.cache.evaluated(name).is_some() {
            return Ok(());
        }
        let definition = self.definition;
        let dataset = definition
            .dataset(name)
            .ok_or_else(|| ExecError::UnknownDataset(name.to_string()))?;

        self.ensure_fetched(dataset)?;
        let mut rows = self.cache.rows(name).map(<[_]>::to_vec).unwrap_or_default();
        if !rows.is_empty() {
            let tablixes: Vec<&'a Tablix> = definition.tablixes_for(&dataset.name).collect();
            self.prepare_lookups(&tablixes)?;
            for row in &mut rows {
                for column in tablixes.iter().flat_map(|t| t.columns.iter()) {
                    let cell = self.evaluate_cell(dataset, row, column)?;
                    row.cells.insert(column.name.clone(), cell);
                }
            }
        }
        self.cache.store_evaluated(name, rows);
        Ok(())
    }

    fn run_query(&self, dataset: &DataSet) -> Result<Vec<RawRow>, ExecError> {
        let datasource = self
            .definition
            .datasource(&dataset.datasource_ref)
            .ok_or_else(|| ExecError::UnknownDatasource {
                dataset: dataset.name.clone(),
                datasource: dataset.datasource_ref.clone(),
            })?;

        let bindings = bind_query_parameters(self.definition, dataset, &self.parameters)?;
        let bound = rewrite_markers(&dataset.query_text, &bindings, self.config.placeholder_style)?;
        log::debug!(target: "EXEC", "Dataset '{}' query: {}", dataset.name, bound.text);

        let request = QueryRequest {
            datasource,
            dataset: &dataset.name,
            text: &bound.text,
            params: &bound.params,
        };
        let rows = self.runner.run(&request).map_err(|source| ExecError::QueryFailed {
            dataset: dataset.name.clone(),
            source,
        })?;
        log::info!(target: "EXEC", "Dataset '{}' returned {} rows", dataset.name, rows.len());
        Ok(rows)
    }

    /// Fetches and indexes every Lookup source the tablixes reference.
    /// Sources that are not declared are left to the evaluator to report.
    fn prepare_lookups(&mut self, tablixes: &[&'a Tablix]) -> Result<(), ExecError> {
        let definition = self.definition;
        for expr in tablixes.iter().flat_map(|t| t.expressions()) {
            for lookup in expr.lookups() {
                if self.cache.has_index(lookup.source_dataset, lookup.key_field) {
                    continue;
                }
                let Some(source) = definition.dataset(lookup.source_dataset) else {
                    continue;
                };
                self.ensure_fetched(source)?;
                self.cache.build_index(lookup.source_dataset, lookup.key_field);
            }
        }
        Ok(())
    }

    fn evaluate_cell(
        &self,
        dataset: &DataSet,
        row: &EvaluatedRow,
        column: &Column,
    ) -> Result<EvaluatedCell, ExecError> {
        let context = EvalContext::for_row(
            self.definition,
            dataset,
            &row.fields,
            row.ordinal,
            &self.parameters,
            &self.cache,
        );
        let eval = |expr: &Expression| -> Result<ScalarValue, ExecError> {
            evaluate(expr, &context).map_err(|cause| ExecError::RowEvaluationFailed {
                dataset: dataset.name.clone(),
                row_index: row.ordinal,
                column: column.name.clone(),
                expression: expr.to_string(),
                cause,
            })
        };

        let mut cell = EvaluatedCell::new(eval(&column.value)?);
        if let Some(sort) = &column.sort_expression {
            cell.sort_key = Some(eval(sort)?);
        }
        if let Some(drill) = &column.drillthrough {
            for param in &drill.parameters {
                cell.drillthrough.push((param.name.clone(), eval(&param.value)?));
            }
        }
        Ok(cell)
    }
}

/// Reads declared fields by their data field name, falling back to the
/// field name. Absent columns are Null.
fn read_fields(dataset: &DataSet, raw: &RawRow) -> IndexMap<String, ScalarValue> {
    dataset
        .fields
        .iter()
        .map(|field| {
            let value = raw
                .get(&field.data_field)
                .or_else(|| raw.get(&field.name))
                .cloned()
                .unwrap_or_default();
            (field.name.clone(), value)
        })
        .collect()
}
