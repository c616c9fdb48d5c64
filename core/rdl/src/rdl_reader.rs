//! FILENAME: core/rdl/src/rdl_reader.rs
//! PURPOSE: Reads RDL documents into a ReportDefinition.
//! CONTEXT: Walks the element tree produced by `xml::parse_document`,
//! validating cross references (dataset -> datasource, tablix -> dataset)
//! and turning every expression-bearing text into a parsed Expression.

use crate::error::ParseError;
use crate::model::{
    Column, ColumnType, DataSet, DataSource, Drillthrough, DrillthroughParameter, Field,
    ParameterDataType, QueryParameter, ReportDefinition, ReportParameter, Style, Tablix,
    ValidValue, ValidValues,
};
use crate::xml::{parse_document, XmlElement};
use parser::{parse_report_text, BinaryOperator, Expression, ScalarValue};
use std::collections::HashSet;
use std::path::Path;

/// Report definition namespaces this reader understands.
pub const SUPPORTED_NAMESPACES: &[&str] = &[
    "http://schemas.microsoft.com/sqlserver/reporting/2005/01/reportdefinition",
    "http://schemas.microsoft.com/sqlserver/reporting/2008/01/reportdefinition",
    "http://schemas.microsoft.com/sqlserver/reporting/2010/01/reportdefinition",
    "http://schemas.microsoft.com/sqlserver/reporting/2016/01/reportdefinition",
];

const DEFAULT_TYPE_NAME: &str = "System.String";
const DEFAULT_COLUMN_WIDTH: &str = "1in";

/// Loads and parses an RDL file from disk.
pub fn load_rdl(path: &Path) -> Result<ReportDefinition, ParseError> {
    let bytes = std::fs::read(path)?;
    parse(&bytes)
}

/// Parses RDL bytes into a ReportDefinition.
pub fn parse(xml_bytes: &[u8]) -> Result<ReportDefinition, ParseError> {
    let root = parse_document(xml_bytes)?;

    if root.name != "Report" {
        return Err(ParseError::missing("Report", "document root"));
    }
    if let Some(namespace) = root.attr("xmlns") {
        if !SUPPORTED_NAMESPACES.contains(&namespace) {
            return Err(ParseError::UnsupportedNamespace(namespace.to_string()));
        }
    }

    let datasources = read_datasources(&root)?;
    let datasets = read_datasets(&root, &datasources)?;
    let parameters = read_parameters(&root)?;
    let tablixes = read_tablixes(&root, &datasets, &parameters)?;

    log::debug!(
        target: "RDL",
        "Parsed report: {} datasources, {} datasets, {} parameters, {} tablixes",
        datasources.len(),
        datasets.len(),
        parameters.len(),
        tablixes.len()
    );

    Ok(ReportDefinition {
        datasources,
        datasets,
        parameters,
        tablixes,
    })
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Tracks names already declared for one kind of element.
struct NameRegistry {
    kind: &'static str,
    seen: HashSet<String>,
}

impl NameRegistry {
    fn new(kind: &'static str) -> Self {
        NameRegistry {
            kind,
            seen: HashSet::new(),
        }
    }

    fn claim(&mut self, name: &str) -> Result<(), ParseError> {
        if self.seen.insert(name.to_string()) {
            Ok(())
        } else {
            Err(ParseError::DuplicateName {
                kind: self.kind,
                name: name.to_string(),
            })
        }
    }
}

fn required_name(element: &XmlElement, context: &str) -> Result<String, ParseError> {
    element
        .attr("Name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ParseError::missing(format!("{}@Name", element.name), context))
}

fn expression(text: &str, context: impl FnOnce() -> String) -> Result<Expression, ParseError> {
    parse_report_text(text).map_err(|source| ParseError::InvalidExpression {
        context: context(),
        source,
    })
}

/// Expression bound to the dataset of its enclosing tablix.
fn tablix_expression(
    text: &str,
    dataset: &str,
    context: impl FnOnce() -> String,
) -> Result<Expression, ParseError> {
    let mut expr = expression(text, context)?;
    expr.qualify_fields(dataset);
    Ok(expr)
}

fn trimmed_child_text(element: &XmlElement, name: &str) -> Option<String> {
    element.child_text(name).map(|t| t.trim().to_string())
}

// ============================================================================
// DATASOURCES AND DATASETS
// ============================================================================

fn read_datasources(root: &XmlElement) -> Result<Vec<DataSource>, ParseError> {
    let mut names = NameRegistry::new("datasource");
    let mut datasources = Vec::new();

    for element in root.descendants("DataSource") {
        let name = required_name(element, "DataSources")?;
        names.claim(&name)?;
        let reference = trimmed_child_text(element, "DataSourceReference").unwrap_or_default();
        datasources.push(DataSource { name, reference });
    }

    Ok(datasources)
}

fn read_datasets(root: &XmlElement, datasources: &[DataSource]) -> Result<Vec<DataSet>, ParseError> {
    let mut names = NameRegistry::new("dataset");
    let mut datasets = Vec::new();

    for element in root.descendants("DataSet") {
        let name = required_name(element, "DataSets")?;
        names.claim(&name)?;
        let context = format!("DataSet '{}'", name);

        let query = element
            .child("Query")
            .ok_or_else(|| ParseError::missing("Query", &context))?;
        let datasource_ref = trimmed_child_text(query, "DataSourceName")
            .ok_or_else(|| ParseError::missing("Query/DataSourceName", &context))?;
        let query_text = query
            .child_text("CommandText")
            .map(str::to_string)
            .ok_or_else(|| ParseError::missing("Query/CommandText", &context))?;

        if !datasources.iter().any(|d| d.name == datasource_ref) {
            return Err(ParseError::missing(
                format!("DataSource '{}'", datasource_ref),
                &context,
            ));
        }

        let query_parameters = read_query_parameters(query, &context)?;
        let fields = read_fields(element, &context)?;

        log::debug!(
            target: "RDL",
            "DataSet '{}': {} fields, {} query parameters",
            name,
            fields.len(),
            query_parameters.len()
        );

        datasets.push(DataSet {
            name,
            datasource_ref,
            query_text,
            query_parameters,
            fields,
        });
    }

    Ok(datasets)
}

fn read_query_parameters(
    query: &XmlElement,
    context: &str,
) -> Result<Vec<QueryParameter>, ParseError> {
    let mut params = Vec::new();

    for element in query.descendants("QueryParameter") {
        let raw_name = required_name(element, context)?;
        let name = raw_name.trim_start_matches('@').to_string();
        let value_text = element.child_text("Value").unwrap_or_default();
        let value = expression(value_text, || {
            format!("{} query parameter '{}'", context, raw_name)
        })?;
        params.push(QueryParameter { name, value });
    }

    Ok(params)
}

fn read_fields(dataset: &XmlElement, context: &str) -> Result<Vec<Field>, ParseError> {
    let mut names = NameRegistry::new("field");
    let mut fields = Vec::new();

    for element in dataset.descendants("Field") {
        let name = required_name(element, context)?;
        names.claim(&name)?;
        let data_field = trimmed_child_text(element, "DataField")
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| name.clone());
        let type_name = trimmed_child_text(element, "TypeName")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TYPE_NAME.to_string());
        fields.push(Field {
            name,
            data_field,
            type_name,
        });
    }

    Ok(fields)
}

// ============================================================================
// REPORT PARAMETERS
// ============================================================================

fn read_parameters(root: &XmlElement) -> Result<Vec<ReportParameter>, ParseError> {
    let mut names = NameRegistry::new("parameter");
    let mut parameters = Vec::new();

    for element in root.descendants("ReportParameter") {
        let name = required_name(element, "ReportParameters")?;
        names.claim(&name)?;

        let data_type = match trimmed_child_text(element, "DataType") {
            Some(text) => ParameterDataType::from_rdl(&text).unwrap_or_else(|| {
                log::warn!(
                    target: "RDL",
                    "Parameter '{}' has unknown DataType '{}', treating as String",
                    name,
                    text
                );
                ParameterDataType::Text
            }),
            None => ParameterDataType::Text,
        };

        let prompt = element
            .child_text("Prompt")
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());

        let default_value = match element.path(&["DefaultValue", "Values", "Value"]) {
            Some(value) if value.attr_local("nil") == Some("true") => {
                Some(Expression::Literal(ScalarValue::Null))
            }
            Some(value) => Some(expression(value.text(), || {
                format!("ReportParameter '{}' default value", name)
            })?),
            None => None,
        };

        let multi_value = element.child_text("MultiValue").map(str::trim) == Some("true");
        let valid_values = element.child("ValidValues").and_then(read_valid_values);

        parameters.push(ReportParameter {
            name,
            prompt,
            data_type,
            default_value,
            multi_value,
            valid_values,
        });
    }

    Ok(parameters)
}

fn read_valid_values(element: &XmlElement) -> Option<ValidValues> {
    if let Some(reference) = element.child("DataSetReference") {
        let text = |name: &str| trimmed_child_text(reference, name).unwrap_or_default();
        return Some(ValidValues::Query {
            dataset: text("DataSetName"),
            value_field: text("ValueField"),
            label_field: text("LabelField"),
        });
    }

    let values = element.child("ParameterValues")?;
    let choices = values
        .children_named("ParameterValue")
        .map(|pv| {
            let value = pv.child_text("Value").unwrap_or_default().to_string();
            let label = pv
                .child_text("Label")
                .map(str::to_string)
                .unwrap_or_else(|| value.clone());
            ValidValue { value, label }
        })
        .collect();
    Some(ValidValues::Static(choices))
}

// ============================================================================
// TABLIXES
// ============================================================================

/// Declarations the column type inference consults.
struct TypeScope<'a> {
    home: &'a str,
    datasets: &'a [DataSet],
    parameters: &'a [ReportParameter],
}

impl TypeScope<'_> {
    fn field_type(&self, dataset: &str, field: &str) -> ColumnType {
        self.datasets
            .iter()
            .find(|d| d.name == dataset)
            .and_then(|d| d.field(field))
            .map(Field::column_type)
            .unwrap_or_default()
    }

    fn infer(&self, expr: &Expression) -> ColumnType {
        match expr {
            Expression::Literal(value) => ColumnType::from_kind(value.kind()),
            Expression::FieldRef { dataset, field } => {
                self.field_type(dataset.as_deref().unwrap_or(self.home), field)
            }
            Expression::ParameterRef { name } => {
                match self.parameters.iter().find(|p| &p.name == name).map(|p| p.data_type) {
                    Some(ParameterDataType::Integer | ParameterDataType::Float) => ColumnType::Number,
                    Some(ParameterDataType::DateTime) => ColumnType::Date,
                    _ => ColumnType::Text,
                }
            }
            Expression::RowNumber { .. } => ColumnType::Number,
            Expression::Lookup {
                source_dataset,
                value_field,
                ..
            } => self.field_type(source_dataset, value_field),
            Expression::BinaryOp { op, .. } => match op {
                BinaryOperator::Concat => ColumnType::Text,
                _ => ColumnType::Number,
            },
            Expression::UnaryOp { .. } => ColumnType::Number,
        }
    }
}

fn read_tablixes(
    root: &XmlElement,
    datasets: &[DataSet],
    parameters: &[ReportParameter],
) -> Result<Vec<Tablix>, ParseError> {
    let mut names = NameRegistry::new("tablix");
    let mut textboxes = NameRegistry::new("textbox");
    let mut tablixes = Vec::new();

    for element in root.descendants("Tablix") {
        let name = required_name(element, "ReportItems")?;
        names.claim(&name)?;
        let context = format!("Tablix '{}'", name);

        let dataset_name = trimmed_child_text(element, "DataSetName")
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ParseError::missing("DataSetName", &context))?;
        if !datasets.iter().any(|d| d.name == dataset_name) {
            return Err(ParseError::missing(
                format!("DataSet '{}'", dataset_name),
                &context,
            ));
        }

        let scope = TypeScope {
            home: &dataset_name,
            datasets,
            parameters,
        };
        let columns = read_columns(element, &name, &scope, &mut textboxes)?;
        check_dataset_refs(&columns, datasets, &context)?;

        log::debug!(
            target: "RDL",
            "Tablix '{}' bound to '{}' with {} columns",
            name,
            dataset_name,
            columns.len()
        );

        tablixes.push(Tablix {
            name,
            dataset_name,
            columns,
        });
    }

    Ok(tablixes)
}

/// RowNumber and Lookup may only name declared datasets.
fn check_dataset_refs(
    columns: &[Column],
    datasets: &[DataSet],
    context: &str,
) -> Result<(), ParseError> {
    for column in columns {
        for expr in column.expressions() {
            if let Some(missing) = expr
                .dataset_refs()
                .into_iter()
                .find(|name| !datasets.iter().any(|d| d.name == *name))
            {
                return Err(ParseError::missing(
                    format!("DataSet '{}'", missing),
                    format!("{} column '{}'", context, column.name),
                ));
            }
        }
    }
    Ok(())
}

fn read_columns(
    tablix: &XmlElement,
    tablix_name: &str,
    scope: &TypeScope<'_>,
    textboxes: &mut NameRegistry,
) -> Result<Vec<Column>, ParseError> {
    let body = tablix.find("TablixBody");
    let column_defs = body
        .map(|b| b.path_all(&["TablixColumns", "TablixColumn"]))
        .unwrap_or_default();
    let rows = body
        .map(|b| b.path_all(&["TablixRows", "TablixRow"]))
        .unwrap_or_default();

    let header_cells = rows.first().map(|r| r.descendants("TablixCell")).unwrap_or_default();
    let detail_cells = rows.get(1).map(|r| r.descendants("TablixCell")).unwrap_or_default();

    let mut columns = Vec::with_capacity(column_defs.len());

    for (i, column_def) in column_defs.iter().enumerate() {
        let width = trimmed_child_text(column_def, "Width")
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| DEFAULT_COLUMN_WIDTH.to_string());

        let header_box = header_cells.get(i).and_then(|cell| cell.find("Textbox"));
        let detail_box = detail_cells.get(i).and_then(|cell| cell.find("Textbox"));

        let name = detail_box
            .and_then(|tb| tb.attr("Name"))
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{}_Column{}", tablix_name, i + 1));
        textboxes.claim(&name)?;

        let mut header_text = String::new();
        let mut header_style = Style::default();
        let mut sort_expression = None;
        if let Some(textbox) = header_box {
            header_text = text_run_value(textbox).unwrap_or_default().to_string();
            header_style = read_style(textbox);
            if let Some(sort) = textbox.path(&["UserSort", "SortExpression"]) {
                sort_expression = Some(tablix_expression(sort.text(), scope.home, || {
                    format!("Tablix '{}' column '{}' sort expression", tablix_name, name)
                })?);
            }
        }

        let mut value = Expression::Literal(ScalarValue::text(""));
        let mut detail_style = Style::default();
        let mut drillthrough = None;
        if let Some(textbox) = detail_box {
            value = tablix_expression(text_run_value(textbox).unwrap_or_default(), scope.home, || {
                format!("Tablix '{}' column '{}' value", tablix_name, name)
            })?;
            detail_style = read_style(textbox);
            drillthrough = read_drillthrough(textbox, scope.home, &name)?;
        }

        let column_type = scope.infer(&value);
        let sort_type = sort_expression
            .as_ref()
            .map_or(column_type, |sort| scope.infer(sort));

        columns.push(Column {
            name,
            width,
            header_text,
            header_style,
            value,
            detail_style,
            column_type,
            sort_expression,
            sort_type,
            drillthrough,
        });
    }

    Ok(columns)
}

/// Text of the first `TextRun/Value` inside a textbox.
fn text_run_value(textbox: &XmlElement) -> Option<&str> {
    textbox
        .descendants("TextRun")
        .into_iter()
        .find_map(|run| run.child("Value"))
        .map(XmlElement::text)
}

fn read_drillthrough(
    textbox: &XmlElement,
    dataset: &str,
    column: &str,
) -> Result<Option<Drillthrough>, ParseError> {
    let Some(drill) = textbox
        .find("ActionInfo")
        .and_then(|info| info.path(&["Actions", "Action", "Drillthrough"]))
    else {
        return Ok(None);
    };
    let Some(report_name) = trimmed_child_text(drill, "ReportName") else {
        return Ok(None);
    };

    let context = format!("column '{}' drillthrough", column);
    let mut parameters = Vec::new();
    for element in drill.descendants("Parameter") {
        let name = required_name(element, &context)?;
        let value_text = element.child_text("Value").unwrap_or_default();
        let value = tablix_expression(value_text, dataset, || {
            format!("{} parameter '{}'", context, name)
        })?;
        parameters.push(DrillthroughParameter { name, value });
    }

    Ok(Some(Drillthrough {
        report_name,
        parameters,
    }))
}

fn read_style(textbox: &XmlElement) -> Style {
    let mut style = Style::default();
    let text = |element: &XmlElement, name: &str| element.child_text(name).map(|t| t.trim().to_string());

    if let Some(box_style) = textbox.child("Style") {
        style.background_color = text(box_style, "BackgroundColor");
        style.vertical_align = text(box_style, "VerticalAlign");
    }

    if let Some(run_style) = textbox.find("TextRun").and_then(|run| run.child("Style")) {
        style.font_size = text(run_style, "FontSize");
        style.font_weight = text(run_style, "FontWeight");
        style.color = text(run_style, "Color");
        style.format = text(run_style, "Format");
    }

    let paragraph_style = textbox
        .descendants("Paragraph")
        .into_iter()
        .find_map(|p| p.child("Style"));
    if let Some(para_style) = paragraph_style {
        style.text_align = text(para_style, "TextAlign");
    }

    style
}
