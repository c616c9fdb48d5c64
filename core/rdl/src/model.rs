//! FILENAME: core/rdl/src/model.rs
//! Report Definition - The parsed, immutable description of a report.
//!
//! This module contains all the types needed to DESCRIBE a report:
//! where its data comes from, which queries run, which parameters the user
//! supplies, and how tablix columns are laid out. These structures are:
//! - Built once per document by the reader
//! - Never mutated afterwards, so one definition can back many executions
//! - Serializable, so callers can cache them keyed by document identity

use parser::{Expression, ScalarKind};
use serde::{Deserialize, Serialize};

// ============================================================================
// DATA SOURCES AND DATASETS
// ============================================================================

/// A named connection declared by the report.
/// The reference is opaque here; a collaborator resolves it to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub reference: String,
}

/// A named query parameter and the expression bound to it.
/// The name is stored without its leading '@'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Expression,
}

/// A declared dataset field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Column of the query result this field reads.
    pub data_field: String,
    /// CLR type name from the designer (e.g., "System.Int32").
    pub type_name: String,
}

impl Field {
    /// Maps the declared CLR type onto the column type hint.
    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_type_name(&self.type_name)
    }
}

/// A named query plus its declared result fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    pub datasource_ref: String,
    /// Raw command text with @Name markers.
    pub query_text: String,
    pub query_parameters: Vec<QueryParameter>,
    /// Declared fields in document order.
    pub fields: Vec<Field>,
}

impl DataSet {
    /// Declared field names, in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds a query parameter by name, ignoring ASCII case.
    pub fn query_parameter(&self, name: &str) -> Option<&QueryParameter> {
        self.query_parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// REPORT PARAMETERS
// ============================================================================

/// Declared type of a report parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ParameterDataType {
    #[default]
    Text,
    Boolean,
    Integer,
    Float,
    DateTime,
}

impl ParameterDataType {
    /// Parses the RDL DataType element text. Unknown names fall back to Text.
    pub fn from_rdl(name: &str) -> Option<Self> {
        match name.trim() {
            "String" => Some(ParameterDataType::Text),
            "Boolean" => Some(ParameterDataType::Boolean),
            "Integer" => Some(ParameterDataType::Integer),
            "Float" => Some(ParameterDataType::Float),
            "DateTime" => Some(ParameterDataType::DateTime),
            _ => None,
        }
    }
}

/// A single static choice for a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidValue {
    pub value: String,
    pub label: String,
}

/// Source of the choices offered for a parameter. Used by the UI only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidValues {
    Static(Vec<ValidValue>),
    Query {
        dataset: String,
        value_field: String,
        label_field: String,
    },
}

/// A report parameter declared by the definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportParameter {
    pub name: String,
    pub prompt: String,
    pub data_type: ParameterDataType,
    /// Unevaluated default; may reference other parameters.
    pub default_value: Option<Expression>,
    pub multi_value: bool,
    pub valid_values: Option<ValidValues>,
}

// ============================================================================
// TABLIX LAYOUT
// ============================================================================

/// Data-type hint of a column. Governs sort comparison downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
}

impl ColumnType {
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name.trim().trim_start_matches("System.") {
            "Int16" | "Int32" | "Int64" | "UInt16" | "UInt32" | "UInt64" | "Byte" | "SByte"
            | "Decimal" | "Double" | "Single" => ColumnType::Number,
            "DateTime" | "DateTimeOffset" | "Date" => ColumnType::Date,
            _ => ColumnType::Text,
        }
    }

    pub fn from_kind(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Number => ColumnType::Number,
            ScalarKind::Date => ColumnType::Date,
            ScalarKind::Null | ScalarKind::Text | ScalarKind::Boolean => ColumnType::Text,
        }
    }
}

/// Presentation style carried through to the renderer unevaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub background_color: Option<String>,
    pub vertical_align: Option<String>,
    pub font_size: Option<String>,
    pub font_weight: Option<String>,
    pub color: Option<String>,
    /// Format string for numbers and dates (e.g., "N2", "d").
    pub format: Option<String>,
    pub text_align: Option<String>,
}

impl Style {
    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }
}

/// A parameter binding on a drillthrough action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillthroughParameter {
    pub name: String,
    pub value: Expression,
}

/// A link from a row to another report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drillthrough {
    pub report_name: String,
    pub parameters: Vec<DrillthroughParameter>,
}

/// A tablix column: header cell plus detail cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Name of the detail textbox; unique within the report.
    pub name: String,
    pub width: String,
    pub header_text: String,
    pub header_style: Style,
    /// Detail cell value.
    pub value: Expression,
    pub detail_style: Style,
    pub column_type: ColumnType,
    /// Present when the header declares an interactive sort.
    pub sort_expression: Option<Expression>,
    /// Type of the sort expression; drives how sort keys compare.
    #[serde(default)]
    pub sort_type: ColumnType,
    pub drillthrough: Option<Drillthrough>,
}

impl Column {
    pub fn is_sortable(&self) -> bool {
        self.sort_expression.is_some()
    }

    /// Value, sort expression and drillthrough bindings, in that order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        let drill = self.drillthrough.iter().flat_map(|d| d.parameters.iter().map(|p| &p.value));
        std::iter::once(&self.value)
            .chain(self.sort_expression.iter())
            .chain(drill)
    }
}

/// A tabular layout bound to one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tablix {
    pub name: String,
    pub dataset_name: String,
    pub columns: Vec<Column>,
}

impl Tablix {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every expression of the tablix: values, sort expressions and
    /// drillthrough bindings, in column order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        self.columns.iter().flat_map(|c| c.expressions())
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete parsed report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportDefinition {
    pub datasources: Vec<DataSource>,
    pub datasets: Vec<DataSet>,
    pub parameters: Vec<ReportParameter>,
    pub tablixes: Vec<Tablix>,
}

impl ReportDefinition {
    pub fn datasource(&self, name: &str) -> Option<&DataSource> {
        self.datasources.iter().find(|d| d.name == name)
    }

    pub fn dataset(&self, name: &str) -> Option<&DataSet> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn parameter(&self, name: &str) -> Option<&ReportParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn tablix(&self, name: &str) -> Option<&Tablix> {
        self.tablixes.iter().find(|t| t.name == name)
    }

    /// Tablixes bound to `dataset`, in document order.
    pub fn tablixes_for<'a>(&'a self, dataset: &'a str) -> impl Iterator<Item = &'a Tablix> + 'a {
        self.tablixes.iter().filter(move |t| t.dataset_name == dataset)
    }

    pub fn has_dataset(&self, name: &str) -> bool {
        self.dataset(name).is_some()
    }
}
