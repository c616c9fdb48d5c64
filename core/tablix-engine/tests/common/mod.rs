//! FILENAME: core/tablix-engine/tests/common/mod.rs
//! Harness for rendering tests: a counting query runner and a small
//! inventory report.

#![allow(dead_code)]

use engine::{QueryRequest, QueryRunner, RawRow, RunnerError};
use indexmap::IndexMap;
use parser::ScalarValue;
use std::cell::RefCell;

/// Serves canned rows per dataset and counts calls.
#[derive(Default)]
pub struct CannedRunner {
    results: IndexMap<String, Vec<RawRow>>,
    calls: RefCell<Vec<String>>,
}

impl CannedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, dataset: &str, rows: Vec<RawRow>) -> Self {
        self.results.insert(dataset.to_string(), rows);
        self
    }

    pub fn calls_for(&self, dataset: &str) -> usize {
        self.calls.borrow().iter().filter(|d| *d == dataset).count()
    }
}

impl QueryRunner for CannedRunner {
    fn run(&self, request: &QueryRequest<'_>) -> Result<Vec<RawRow>, RunnerError> {
        self.calls.borrow_mut().push(request.dataset.to_string());
        Ok(self.results.get(request.dataset).cloned().unwrap_or_default())
    }
}

pub fn raw(pairs: &[(&str, ScalarValue)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Items with stock levels, a Bins lookup source, and two tablixes:
/// `Stock` over Items and `BinList` over Bins.
pub const INVENTORY_RDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Report xmlns="http://schemas.microsoft.com/sqlserver/reporting/2010/01/reportdefinition" xmlns:rd="http://schemas.microsoft.com/SQLServer/reporting/reportdesigner">
  <DataSources>
    <DataSource Name="Inventory"><DataSourceReference>/Shared/Inventory</DataSourceReference></DataSource>
  </DataSources>
  <DataSets>
    <DataSet Name="Items">
      <Query>
        <DataSourceName>Inventory</DataSourceName>
        <QueryParameters>
          <QueryParameter Name="@Site"><Value>=Parameters!Site.Value</Value></QueryParameter>
        </QueryParameters>
        <CommandText>SELECT sku, qty, active, counted FROM items WHERE site = @Site</CommandText>
      </Query>
      <Fields>
        <Field Name="Sku"><DataField>sku</DataField></Field>
        <Field Name="Qty"><DataField>qty</DataField><rd:TypeName>System.Int32</rd:TypeName></Field>
        <Field Name="Active"><DataField>active</DataField><rd:TypeName>System.Boolean</rd:TypeName></Field>
        <Field Name="Counted"><DataField>counted</DataField><rd:TypeName>System.DateTime</rd:TypeName></Field>
      </Fields>
    </DataSet>
    <DataSet Name="Bins">
      <Query>
        <DataSourceName>Inventory</DataSourceName>
        <CommandText>SELECT sku, bin FROM bins</CommandText>
      </Query>
      <Fields>
        <Field Name="Sku"><DataField>sku</DataField></Field>
        <Field Name="Bin"><DataField>bin</DataField></Field>
      </Fields>
    </DataSet>
  </DataSets>
  <ReportParameters>
    <ReportParameter Name="Site">
      <DataType>String</DataType>
      <DefaultValue><Values><Value>Main</Value></Values></DefaultValue>
    </ReportParameter>
  </ReportParameters>
  <Body>
    <ReportItems>
      <Tablix Name="Stock">
        <TablixBody>
          <TablixColumns>
            <TablixColumn><Width>1.5in</Width></TablixColumn>
            <TablixColumn><Width>1in</Width></TablixColumn>
            <TablixColumn><Width>0.75in</Width></TablixColumn>
            <TablixColumn><Width>1in</Width></TablixColumn>
            <TablixColumn><Width>1in</Width></TablixColumn>
          </TablixColumns>
          <TablixRows>
            <TablixRow>
              <TablixCells>
                <TablixCell><CellContents><Textbox Name="HdrSku"><Paragraphs><Paragraph><TextRuns><TextRun><Value>SKU</Value></TextRun></TextRuns></Paragraph></Paragraphs><UserSort><SortExpression>=Fields!Sku.Value</SortExpression></UserSort><Style><BackgroundColor>LightGrey</BackgroundColor></Style></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="HdrQty"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Quantity</Value></TextRun></TextRuns></Paragraph></Paragraphs><UserSort><SortExpression>=Fields!Qty.Value</SortExpression></UserSort></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="HdrActive"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Active</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="HdrCounted"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Counted</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="HdrBin"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Bin</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
              </TablixCells>
            </TablixRow>
            <TablixRow>
              <TablixCells>
                <TablixCell>
                  <CellContents>
                    <Textbox Name="Sku">
                      <Paragraphs><Paragraph><TextRuns><TextRun><Value>=Fields!Sku.Value</Value></TextRun></TextRuns><Style><TextAlign>Left</TextAlign></Style></Paragraph></Paragraphs>
                      <ActionInfo><Actions><Action><Drillthrough>
                        <ReportName>/Inventory/Item History</ReportName>
                        <Parameters>
                          <Parameter Name="Sku"><Value>=Fields!Sku.Value</Value></Parameter>
                          <Parameter Name="Site"><Value>=Parameters!Site.Value</Value></Parameter>
                        </Parameters>
                      </Drillthrough></Action></Actions></ActionInfo>
                    </Textbox>
                  </CellContents>
                </TablixCell>
                <TablixCell><CellContents><Textbox Name="Qty"><Paragraphs><Paragraph><TextRuns><TextRun><Value>=Fields!Qty.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="Active"><Paragraphs><Paragraph><TextRuns><TextRun><Value>=Fields!Active.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="Counted"><Paragraphs><Paragraph><TextRuns><TextRun><Value>=Fields!Counted.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                <TablixCell><CellContents><Textbox Name="ItemBin"><Paragraphs><Paragraph><TextRuns><TextRun><Value>=Lookup(Fields!Sku.Value, Fields!Sku.Value, Fields!Bin.Value, "Bins")</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
              </TablixCells>
            </TablixRow>
          </TablixRows>
        </TablixBody>
        <DataSetName>Items</DataSetName>
      </Tablix>
      <Tablix Name="BinList">
        <TablixBody>
          <TablixColumns><TablixColumn><Width>1in</Width></TablixColumn></TablixColumns>
          <TablixRows>
            <TablixRow><TablixCells><TablixCell><CellContents><Textbox Name="HdrBinName"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Bin</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell></TablixCells></TablixRow>
            <TablixRow><TablixCells><TablixCell><CellContents><Textbox Name="BinName"><Paragraphs><Paragraph><TextRuns><TextRun><Value>=Fields!Bin.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell></TablixCells></TablixRow>
          </TablixRows>
        </TablixBody>
        <DataSetName>Bins</DataSetName>
      </Tablix>
    </ReportItems>
  </Body>
</Report>
"#;
