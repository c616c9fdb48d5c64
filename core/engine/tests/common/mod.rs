//! FILENAME: core/engine/tests/common/mod.rs
//! Shared harness for engine integration tests: a recording query runner
//! and small RDL fixtures.

#![allow(dead_code)]

use engine::{QueryRequest, QueryRunner, RawRow, RunnerError};
use indexmap::IndexMap;
use parser::ScalarValue;
use rdl::ReportDefinition;
use std::cell::RefCell;

/// What the runner saw for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub datasource: String,
    pub dataset: String,
    pub text: String,
    pub params: IndexMap<String, ScalarValue>,
}

/// Serves canned rows per dataset and records every request.
#[derive(Default)]
pub struct MockRunner {
    results: IndexMap<String, Vec<RawRow>>,
    failing: Option<String>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, dataset: &str, rows: Vec<RawRow>) -> Self {
        self.results.insert(dataset.to_string(), rows);
        self
    }

    /// Makes every query for `dataset` fail.
    pub fn failing_on(mut self, dataset: &str) -> Self {
        self.failing = Some(dataset.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_for(&self, dataset: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.dataset == dataset).count()
    }
}

impl QueryRunner for MockRunner {
    fn run(&self, request: &QueryRequest<'_>) -> Result<Vec<RawRow>, RunnerError> {
        self.calls.borrow_mut().push(RecordedCall {
            datasource: request.datasource.name.clone(),
            dataset: request.dataset.to_string(),
            text: request.text.to_string(),
            params: request.params.clone(),
        });
        if self.failing.as_deref() == Some(request.dataset) {
            return Err(format!("connection refused while running {}", request.dataset).into());
        }
        Ok(self.results.get(request.dataset).cloned().unwrap_or_default())
    }
}

/// Builds a raw row from (column, value) pairs.
pub fn raw(pairs: &[(&str, ScalarValue)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn num(n: f64) -> ScalarValue {
    ScalarValue::Number(n)
}

pub fn text(s: &str) -> ScalarValue {
    ScalarValue::text(s)
}

// ============================================================================
// RDL FIXTURES
// ============================================================================

const NS: &str = "http://schemas.microsoft.com/sqlserver/reporting/2016/01/reportdefinition";

/// A dataset element. `params` are (name without '@', value expression),
/// `fields` are (name, data field).
pub fn dataset_xml(name: &str, command: &str, params: &[(&str, &str)], fields: &[(&str, &str)]) -> String {
    let params_xml = if params.is_empty() {
        String::new()
    } else {
        let inner: String = params
            .iter()
            .map(|(n, v)| format!(r#"<QueryParameter Name="@{}"><Value>{}</Value></QueryParameter>"#, n, v))
            .collect();
        format!("<QueryParameters>{}</QueryParameters>", inner)
    };
    let fields_xml: String = fields
        .iter()
        .map(|(n, df)| format!(r#"<Field Name="{}"><DataField>{}</DataField></Field>"#, n, df))
        .collect();
    format!(
        r#"<DataSet Name="{}"><Query><DataSourceName>Main</DataSourceName>{}<CommandText>{}</CommandText></Query><Fields>{}</Fields></DataSet>"#,
        name, params_xml, command, fields_xml
    )
}

fn textbox_cell(name: &str, value: &str, extra: &str) -> String {
    format!(
        r#"<TablixCell><CellContents><Textbox Name="{}"><Paragraphs><Paragraph><TextRuns><TextRun><Value>{}</Value></TextRun></TextRuns></Paragraph></Paragraphs>{}</Textbox></CellContents></TablixCell>"#,
        name, value, extra
    )
}

/// A tablix over `dataset`. Columns are (detail textbox name, value);
/// each header shows the column name.
pub fn tablix_xml(name: &str, dataset: &str, columns: &[(&str, &str)]) -> String {
    let widths: String = columns
        .iter()
        .map(|_| "<TablixColumn><Width>1in</Width></TablixColumn>")
        .collect();
    let header: String = columns
        .iter()
        .map(|(col, _)| textbox_cell(&format!("{}_{}_Header", name, col), col, ""))
        .collect();
    let detail: String = columns
        .iter()
        .map(|(col, value)| textbox_cell(col, value, ""))
        .collect();
    format!(
        r#"<Tablix Name="{}"><TablixBody><TablixColumns>{}</TablixColumns><TablixRows><TablixRow><TablixCells>{}</TablixCells></TablixRow><TablixRow><TablixCells>{}</TablixCells></TablixRow></TablixRows></TablixBody><DataSetName>{}</DataSetName></Tablix>"#,
        name, widths, header, detail, dataset
    )
}

/// Assembles a report from datasets, parameter elements and tablixes.
pub fn report_xml(datasets: &[String], parameters: &str, tablixes: &[String]) -> String {
    format!(
        r#"<Report xmlns="{}"><DataSources><DataSource Name="Main"><DataSourceReference>/Shared/Main</DataSourceReference></DataSource></DataSources><DataSets>{}</DataSets><ReportParameters>{}</ReportParameters><ReportSections><ReportSection><Body><ReportItems>{}</ReportItems></Body></ReportSection></ReportSections></Report>"#,
        NS,
        datasets.concat(),
        parameters,
        tablixes.concat()
    )
}

pub fn parse_report(xml: &str) -> ReportDefinition {
    rdl::parse(xml.as_bytes()).unwrap()
}

pub const REGION_PARAM: &str = r#"<ReportParameter Name="Region"><DataType>String</DataType><DefaultValue><Values><Value>North</Value></Values></DefaultValue></ReportParameter>"#;

pub const STATUS_PARAM: &str = r#"<ReportParameter Name="Status"><DataType>String</DataType><MultiValue>true</MultiValue></ReportParameter>"#;

/// Orders filtered by region and status, plus a D1 lookup source.
///
/// OrderTable columns: RowNo, Net (Amount - 1), Val (Lookup into D1 by K),
/// Label ("Order " &amp; Id).
pub fn orders_report() -> ReportDefinition {
    let orders = dataset_xml(
        "Orders",
        "SELECT id, amount, k FROM orders WHERE region = @Region AND status IN (@Status)",
        &[("Region", "=Parameters!Region.Value"), ("Status", "=Parameters!Status.Value")],
        &[("Id", "id"), ("Amount", "amount"), ("K", "k")],
    );
    let d1 = dataset_xml("D1", "SELECT key, val FROM d1", &[], &[("Key", "key"), ("Val", "val")]);
    let table = tablix_xml(
        "OrderTable",
        "Orders",
        &[
            ("RowNo", r#"=RowNumber("Orders")"#),
            ("Net", "=Fields!Amount.Value - 1"),
            ("Val", r#"=Lookup(Fields!K.Value, Fields!Key.Value, Fields!Val.Value, "D1")"#),
            ("Label", r#"="Order " &amp; Fields!Id.Value"#),
        ],
    );
    parse_report(&report_xml(
        &[orders, d1],
        &format!("{}{}", REGION_PARAM, STATUS_PARAM),
        &[table],
    ))
}

/// Rows for Orders: {1, 10.0, "A"} and {2, Null, "Z"}.
pub fn orders_rows() -> Vec<RawRow> {
    vec![
        raw(&[("id", num(1.0)), ("amount", num(10.0)), ("k", text("A"))]),
        raw(&[("id", num(2.0)), ("amount", ScalarValue::Null), ("k", text("Z"))]),
    ]
}

/// Rows for D1: {"A", 1}, {"A", 2}.
pub fn d1_rows() -> Vec<RawRow> {
    vec![
        raw(&[("key", text("A")), ("val", num(1.0))]),
        raw(&[("key", text("A")), ("val", num(2.0))]),
    ]
}
