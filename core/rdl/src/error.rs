//! FILENAME: core/rdl/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Unsupported report definition namespace: {0}")]
    UnsupportedNamespace(String),

    #[error("Missing element {element} in {context}")]
    MissingElement { element: String, context: String },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Invalid expression in {context}: {source}")]
    InvalidExpression {
        context: String,
        #[source]
        source: parser::ParseError,
    },
}

impl ParseError {
    pub(crate) fn missing(element: impl Into<String>, context: impl Into<String>) -> Self {
        ParseError::MissingElement {
            element: element.into(),
            context: context.into(),
        }
    }
}
