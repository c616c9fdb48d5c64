//! FILENAME: core/engine/src/row.rs
//! PURPOSE: Row types flowing out of the query runner and out of the engine.

use indexmap::IndexMap;
use parser::ScalarValue;
use serde::{Deserialize, Serialize};

/// One row as returned by the query runner: result column name -> value,
/// in result column order.
pub type RawRow = IndexMap<String, ScalarValue>;

/// The evaluated cell of one tablix column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluatedCell {
    pub value: ScalarValue,
    /// Evaluated sort expression; present only for user-sortable columns.
    pub sort_key: Option<ScalarValue>,
    /// Evaluated drillthrough bindings, in declaration order.
    pub drillthrough: Vec<(String, ScalarValue)>,
}

impl EvaluatedCell {
    pub fn new(value: ScalarValue) -> Self {
        EvaluatedCell {
            value,
            sort_key: None,
            drillthrough: Vec::new(),
        }
    }
}

/// A fully evaluated row of a dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluatedRow {
    /// 1-based position within the dataset's result.
    pub ordinal: usize,
    /// Declared field name -> value, in declaration order.
    pub fields: IndexMap<String, ScalarValue>,
    /// Column name -> evaluated cell, for every tablix column bound to the dataset.
    pub cells: IndexMap<String, EvaluatedCell>,
}

impl EvaluatedRow {
    pub fn new(ordinal: usize, fields: IndexMap<String, ScalarValue>) -> Self {
        EvaluatedRow {
            ordinal,
            fields,
            cells: IndexMap::new(),
        }
    }

    /// Resolves a name as a field first, then as a column value.
    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.fields
            .get(name)
            .or_else(|| self.cells.get(name).map(|cell| &cell.value))
    }

    pub fn field(&self, name: &str) -> Option<&ScalarValue> {
        self.fields.get(name)
    }

    pub fn cell(&self, column: &str) -> Option<&EvaluatedCell> {
        self.cells.get(column)
    }
}
