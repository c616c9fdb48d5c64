//! FILENAME: core/tablix-engine/src/render.rs
//! PURPOSE: End-to-end rendering of tablixes from a report definition.
//! CONTEXT: Opens one ReportExecution per call, so every tablix rendered
//! in that call shares resolved parameters, dataset results and Lookup
//! indices.

use crate::engine::project;
use crate::view::RenderTable;
use engine::{EngineConfig, ExecError, ParameterValues, QueryRunner, ReportExecution};
use rdl::ReportDefinition;

/// Executes the dataset behind `tablix_name` and projects it.
pub fn render_tablix(
    definition: &ReportDefinition,
    tablix_name: &str,
    user_parameters: &ParameterValues,
    runner: &dyn QueryRunner,
    config: &EngineConfig,
) -> Result<RenderTable, ExecError> {
    let tablix = definition
        .tablix(tablix_name)
        .ok_or_else(|| ExecError::UnknownTablix(tablix_name.to_string()))?;
    let mut session = ReportExecution::new(definition, user_parameters, runner, config)?;
    let rows = session.rows(&tablix.dataset_name)?;
    Ok(project(tablix, rows))
}

/// Renders every tablix of the definition, in document order.
pub fn render_report(
    definition: &ReportDefinition,
    user_parameters: &ParameterValues,
    runner: &dyn QueryRunner,
    config: &EngineConfig,
) -> Result<Vec<RenderTable>, ExecError> {
    let mut session = ReportExecution::new(definition, user_parameters, runner, config)?;
    let mut tables = Vec::with_capacity(definition.tablixes.len());
    for tablix in &definition.tablixes {
        let rows = session.rows(&tablix.dataset_name)?;
        tables.push(project(tablix, rows));
    }
    log::info!(target: "TABLIX", "Rendered {} tablixes", tables.len());
    Ok(tables)
}
