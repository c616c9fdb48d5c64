//! FILENAME: core/rdl/src/lib.rs
//! RDL Definition Module
//!
//! Reads report definition (RDL) documents into an immutable
//! `ReportDefinition`: datasources, datasets with their queries and
//! declared fields, report parameters, and tablix layouts whose cell
//! texts have already been parsed into expressions.

mod error;
mod model;
mod rdl_reader;
pub mod xml;

pub use error::ParseError;
pub use model::{
    Column, ColumnType, DataSet, DataSource, Drillthrough, DrillthroughParameter, Field,
    ParameterDataType, QueryParameter, ReportDefinition, ReportParameter, Style, Tablix,
    ValidValue, ValidValues,
};
pub use rdl_reader::{load_rdl, parse, SUPPORTED_NAMESPACES};
