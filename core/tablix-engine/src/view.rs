//! FILENAME: core/tablix-engine/src/view.rs
//! Tablix View - Render-ready output for presentation collaborators.
//!
//! This module holds the typed table a tablix projects to: one header per
//! column, one row per evaluated dataset row, and per cell the raw value,
//! its display string, carried style, sort key and drillthrough target.
//! Nothing here knows about HTML, spreadsheets or URLs.

use chrono::NaiveDateTime;
use parser::ScalarValue;
use rdl::{ColumnType, Style};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// CELL TYPES AND METADATA
// ============================================================================

/// How a cell's value should be treated, from the column's type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Text,
    Number,
    Date,
}

impl From<ColumnType> for CellKind {
    fn from(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Text => CellKind::Text,
            ColumnType::Number => CellKind::Number,
            ColumnType::Date => CellKind::Date,
        }
    }
}

/// Direction for interactive sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A typed, totally ordered sort key.
///
/// Numbers compare numerically, dates chronologically and text
/// case-insensitively. Values that do not fit the column's kind fall back
/// to text. Null sorts after everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortKey {
    Number(f64),
    Date(NaiveDateTime),
    /// Lowercased display text.
    Text(String),
    Null,
}

impl SortKey {
    /// Builds the key for `value` in a column of `kind`.
    pub fn from_value(value: &ScalarValue, kind: CellKind) -> Self {
        match (kind, value) {
            (_, ScalarValue::Null) => SortKey::Null,
            (CellKind::Number, v) => match v.as_number() {
                Some(n) if !n.is_nan() => SortKey::Number(n),
                _ => SortKey::text(v),
            },
            (CellKind::Date, ScalarValue::Date(d)) => SortKey::Date(*d),
            (_, v) => SortKey::text(v),
        }
    }

    fn text(value: &ScalarValue) -> Self {
        SortKey::Text(value.to_string().to_lowercase())
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Date(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Null => 3,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SortKey::Null)
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Target of a drillthrough action with its evaluated bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillthroughLink {
    /// Target report path as written in the definition, e.g. "/Sales/Detail".
    pub report_name: String,
    /// Parameter name -> evaluated value, in declaration order.
    pub parameters: Vec<(String, ScalarValue)>,
}

impl DrillthroughLink {
    /// Last path segment of the target report.
    pub fn report_file(&self) -> &str {
        self.report_name.rsplit('/').next().unwrap_or_default()
    }
}

/// Renders a carried style as a CSS declaration list.
pub trait StyleCss {
    fn to_css(&self) -> String;
}

impl StyleCss for Style {
    fn to_css(&self) -> String {
        let declarations = [
            ("background-color", self.background_color.clone()),
            ("color", self.color.clone()),
            ("font-size", self.font_size.clone()),
            ("font-weight", self.font_weight.clone()),
            ("text-align", self.text_align.as_deref().map(str::to_lowercase)),
            ("vertical-align", self.vertical_align.as_deref().map(str::to_lowercase)),
        ];
        declarations
            .iter()
            .filter_map(|(property, value)| value.as_ref().map(|v| format!("{}: {}", property, v)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ============================================================================
// VIEW CELLS, ROWS, HEADERS
// ============================================================================

/// A single detail cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderCell {
    /// The evaluated value.
    pub value: ScalarValue,
    pub kind: CellKind,
    /// Pre-formatted display string.
    pub formatted: String,
    /// Detail style of the column.
    pub style: Style,
    /// Present for sortable columns.
    pub sort_key: Option<SortKey>,
    pub drillthrough: Option<DrillthroughLink>,
}

/// One detail row of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRow {
    /// 1-based position within the dataset result.
    pub ordinal: usize,
    /// Cells in column order.
    pub cells: Vec<RenderCell>,
}

/// Describes a column of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderHeader {
    /// Column (detail textbox) name.
    pub name: String,
    pub text: String,
    pub style: Style,
    pub kind: CellKind,
    pub sortable: bool,
    pub width: String,
}

// ============================================================================
// MAIN VIEW STRUCT
// ============================================================================

/// The complete projected view of one tablix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderTable {
    pub tablix_name: String,
    pub dataset_name: String,
    /// Headers in document order.
    pub headers: Vec<RenderHeader>,
    /// Rows in dataset order.
    pub rows: Vec<RenderRow>,
}

impl RenderTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.name == name)
    }

    /// Gets a cell at the specified position.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&RenderCell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Row positions ordered by `column`, stable for equal keys.
    /// Nulls come last in both directions. Columns without a sort
    /// expression are ordered by their cell value. Returns None for an
    /// unknown column.
    pub fn sorted_order(&self, column: &str, direction: SortDirection) -> Option<Vec<usize>> {
        let col = self.column_index(column)?;
        let kind = self.headers[col].kind;

        let keys: Vec<SortKey> = self
            .rows
            .iter()
            .map(|row| match row.cells.get(col) {
                Some(cell) => cell
                    .sort_key
                    .clone()
                    .unwrap_or_else(|| SortKey::from_value(&cell.value, kind)),
                None => SortKey::Null,
            })
            .collect();

        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| {
            let (ka, kb) = (&keys[a], &keys[b]);
            match (ka.is_null(), kb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => match direction {
                    SortDirection::Ascending => ka.cmp(kb),
                    SortDirection::Descending => kb.cmp(ka),
                },
            }
        });
        Some(order)
    }

    /// Rows in the given order, e.g. from `sorted_order`.
    pub fn rows_in_order<'a>(&'a self, order: &'a [usize]) -> impl Iterator<Item = &'a RenderRow> + 'a {
        order.iter().filter_map(move |&i| self.rows.get(i))
    }
}
