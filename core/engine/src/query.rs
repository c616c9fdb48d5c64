//! FILENAME: core/engine/src/query.rs
//! PURPOSE: Binds dataset query parameters and rewrites @Name markers.
//! CONTEXT: Command text carries `@Name` markers. Before the text reaches
//! the query runner, each marker is replaced by a placeholder in the
//! runner's syntax and its value goes into a separate parameter map.
//! Values are never spliced into the text.
//!
//! The tokenizer only understands enough SQL to avoid rewriting markers
//! that are not markers: string literals ('...' with '' escapes), quoted
//! and bracketed identifiers, line and block comments, and @@variables.

use crate::config::PlaceholderStyle;
use crate::error::{EvalError, ExecError};
use crate::evaluator::{evaluate, EvalContext};
use crate::parameters::{ParameterValue, ParameterValues};
use indexmap::IndexMap;
use parser::{Expression, ScalarValue};
use rdl::{DataSet, ReportDefinition};

/// Command text ready for the query runner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundQuery {
    pub text: String,
    /// Placeholder name (declared parameter name, no sigil) -> value.
    pub params: IndexMap<String, ScalarValue>,
}

/// Evaluates the dataset's query parameter bindings.
/// A binding that is exactly a multi-value report parameter keeps the
/// whole list; anything else evaluates to a single scalar.
pub fn bind_query_parameters(
    definition: &ReportDefinition,
    dataset: &DataSet,
    parameters: &ParameterValues,
) -> Result<IndexMap<String, ParameterValue>, ExecError> {
    let context = EvalContext::without_row(definition, parameters);
    let mut bound = IndexMap::new();

    for qp in &dataset.query_parameters {
        let value = match &qp.value {
            Expression::ParameterRef { name } => match parameters.get(name) {
                Some(value) => value.clone(),
                None => {
                    return Err(ExecError::QueryParameterEvaluation {
                        dataset: dataset.name.clone(),
                        name: qp.name.clone(),
                        cause: EvalError::UnknownParameter(name.clone()),
                    })
                }
            },
            expr => ParameterValue::Single(evaluate(expr, &context).map_err(|cause| {
                ExecError::QueryParameterEvaluation {
                    dataset: dataset.name.clone(),
                    name: qp.name.clone(),
                    cause,
                }
            })?),
        };
        bound.insert(qp.name.clone(), value);
    }

    Ok(bound)
}

/// Rewrites every `@Name` marker in `text` to `style` placeholders.
/// Markers match `bindings` keys ignoring ASCII case; an unmatched marker
/// fails with `UnboundParameter`.
pub fn rewrite_markers(
    text: &str,
    bindings: &IndexMap<String, ParameterValue>,
    style: PlaceholderStyle,
) -> Result<BoundQuery, ExecError> {
    MarkerRewriter::new(text, bindings, style).run()
}

struct MarkerRewriter<'a> {
    chars: Vec<char>,
    pos: usize,
    output: String,
    params: IndexMap<String, ScalarValue>,
    bindings: &'a IndexMap<String, ParameterValue>,
    style: PlaceholderStyle,
}

impl<'a> MarkerRewriter<'a> {
    fn new(text: &str, bindings: &'a IndexMap<String, ParameterValue>, style: PlaceholderStyle) -> Self {
        MarkerRewriter {
            chars: text.chars().collect(),
            pos: 0,
            output: String::with_capacity(text.len()),
            params: IndexMap::new(),
            bindings,
            style,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    /// Copies the current character to the output and advances.
    fn copy(&mut self) {
        if let Some(ch) = self.peek() {
            self.output.push(ch);
            self.pos += 1;
        }
    }

    fn run(mut self) -> Result<BoundQuery, ExecError> {
        while let Some(ch) = self.peek() {
            match ch {
                '\'' | '"' => self.copy_quoted(ch, ch),
                '[' => self.copy_quoted('[', ']'),
                '-' if self.peek_next() == Some('-') => self.copy_line_comment(),
                '/' if self.peek_next() == Some('*') => self.copy_block_comment(),
                '@' if self.peek_next() == Some('@') => {
                    // @@ROWCOUNT and friends belong to the server
                    self.copy();
                    self.copy();
                    self.copy_identifier();
                }
                '@' if self.peek_next().is_some_and(is_ident_start) => {
                    self.pos += 1;
                    let name = self.read_identifier();
                    self.emit_marker(&name)?;
                }
                _ => self.copy(),
            }
        }

        Ok(BoundQuery {
            text: self.output,
            params: self.params,
        })
    }

    /// Copies a delimited run verbatim. A doubled closing delimiter is an
    /// escape and does not end the run. Unterminated runs extend to the end.
    fn copy_quoted(&mut self, open: char, close: char) {
        debug_assert_eq!(self.peek(), Some(open));
        self.copy();
        while let Some(ch) = self.peek() {
            self.copy();
            if ch == close {
                if self.peek() == Some(close) {
                    self.copy();
                } else {
                    break;
                }
            }
        }
    }

    fn copy_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.copy();
        }
    }

    fn copy_block_comment(&mut self) {
        self.copy();
        self.copy();
        while self.peek().is_some() {
            if self.peek() == Some('*') && self.peek_next() == Some('/') {
                self.copy();
                self.copy();
                break;
            }
            self.copy();
        }
    }

    fn copy_identifier(&mut self) {
        while self.peek().is_some_and(is_ident_char) {
            self.copy();
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn emit_marker(&mut self, marker: &str) -> Result<(), ExecError> {
        let bindings = self.bindings;
        let (name, value) = bindings
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(marker))
            .ok_or_else(|| ExecError::UnboundParameter(marker.to_string()))?;

        match value {
            ParameterValue::Single(v) => {
                self.output.push_str(&self.style.render(name));
                self.params.insert(name.clone(), v.clone());
            }
            ParameterValue::Multi(values) if values.is_empty() => {
                self.output.push_str("NULL");
            }
            ParameterValue::Multi(values) => {
                let placeholders: Vec<String> = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let expanded = format!("{}_{}", name, i + 1);
                        let placeholder = self.style.render(&expanded);
                        self.params.insert(expanded, v.clone());
                        placeholder
                    })
                    .collect();
                self.output.push_str(&placeholders.join(", "));
            }
        }
        Ok(())
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
