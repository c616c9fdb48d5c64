//! FILENAME: core/tablix-engine/src/engine.rs
//! Tablix projection - Maps evaluated rows onto a tablix layout.
//!
//! The execution bridge has already evaluated every column expression per
//! row; projection only arranges those results into headers and cells,
//! attaching display strings, styles, sort keys and drillthrough targets.
//! No expression is evaluated here.

use crate::format::format_value;
use crate::view::{
    CellKind, DrillthroughLink, RenderCell, RenderHeader, RenderRow, RenderTable, SortKey,
};
use engine::{EvaluatedCell, EvaluatedRow};
use parser::ScalarValue;
use rdl::{Column, Tablix};

/// Builds the render table for one tablix from its dataset's rows.
pub struct TablixProjector<'a> {
    tablix: &'a Tablix,
    rows: &'a [EvaluatedRow],
}

impl<'a> TablixProjector<'a> {
    pub fn new(tablix: &'a Tablix, rows: &'a [EvaluatedRow]) -> Self {
        TablixProjector { tablix, rows }
    }

    pub fn project(&self) -> RenderTable {
        let headers = self.tablix.columns.iter().map(project_header).collect();
        let rows = self.rows.iter().map(|row| self.project_row(row)).collect();

        log::debug!(
            target: "TABLIX",
            "Projected tablix '{}': {} columns, {} rows",
            self.tablix.name,
            self.tablix.columns.len(),
            self.rows.len()
        );

        RenderTable {
            tablix_name: self.tablix.name.clone(),
            dataset_name: self.tablix.dataset_name.clone(),
            headers,
            rows,
        }
    }

    fn project_row(&self, row: &EvaluatedRow) -> RenderRow {
        let cells = self
            .tablix
            .columns
            .iter()
            .map(|column| match row.cell(&column.name) {
                Some(evaluated) => project_cell(column, evaluated),
                None => {
                    log::warn!(
                        target: "TABLIX",
                        "Row {} of '{}' has no value for column '{}'",
                        row.ordinal,
                        self.tablix.dataset_name,
                        column.name
                    );
                    project_cell(column, &EvaluatedCell::new(ScalarValue::Null))
                }
            })
            .collect();

        RenderRow {
            ordinal: row.ordinal,
            cells,
        }
    }
}

fn project_header(column: &Column) -> RenderHeader {
    RenderHeader {
        name: column.name.clone(),
        text: column.header_text.clone(),
        style: column.header_style.clone(),
        kind: CellKind::from(column.column_type),
        sortable: column.is_sortable(),
        width: column.width.clone(),
    }
}

fn project_cell(column: &Column, evaluated: &EvaluatedCell) -> RenderCell {
    let kind = CellKind::from(column.column_type);

    // The sort expression's own type decides the key, not the displayed value's.
    let sort_key = match &evaluated.sort_key {
        Some(sort) => Some(SortKey::from_value(sort, CellKind::from(column.sort_type))),
        None if column.is_sortable() => Some(SortKey::from_value(&evaluated.value, kind)),
        None => None,
    };

    let drillthrough = column.drillthrough.as_ref().map(|drill| DrillthroughLink {
        report_name: drill.report_name.clone(),
        parameters: drill
            .parameters
            .iter()
            .map(|p| {
                let value = evaluated
                    .drillthrough
                    .iter()
                    .find(|(name, _)| *name == p.name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                (p.name.clone(), value)
            })
            .collect(),
    });

    RenderCell {
        formatted: format_value(&evaluated.value),
        value: evaluated.value.clone(),
        kind,
        style: column.detail_style.clone(),
        sort_key,
        drillthrough,
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Projects evaluated rows onto a tablix layout.
pub fn project(tablix: &Tablix, rows: &[EvaluatedRow]) -> RenderTable {
    TablixProjector::new(tablix, rows).project()
}
