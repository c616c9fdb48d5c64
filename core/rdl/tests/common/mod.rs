//! FILENAME: core/rdl/tests/common/mod.rs
//! Fixture documents shared by the RDL reader integration tests.

#![allow(dead_code)]

pub const NS_2016: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/2016/01/reportdefinition";

/// A warehouse order report exercising every construct the reader handles.
pub const ORDERS_RDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Report xmlns="http://schemas.microsoft.com/sqlserver/reporting/2016/01/reportdefinition" xmlns:rd="http://schemas.microsoft.com/SQLServer/reporting/reportdesigner" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <DataSources>
    <DataSource Name="Warehouse">
      <DataSourceReference>/Shared/Warehouse</DataSourceReference>
    </DataSource>
  </DataSources>
  <DataSets>
    <DataSet Name="Orders">
      <Query>
        <DataSourceName>Warehouse</DataSourceName>
        <QueryParameters>
          <QueryParameter Name="@Region">
            <Value>=Parameters!Region.Value</Value>
          </QueryParameter>
        </QueryParameters>
        <CommandText>SELECT Id, Customer, Amount, OrderDate, Sku FROM Orders WHERE Region = @Region</CommandText>
      </Query>
      <Fields>
        <Field Name="Id">
          <DataField>order_id</DataField>
          <rd:TypeName>System.Int32</rd:TypeName>
        </Field>
        <Field Name="Customer">
          <DataField>Customer</DataField>
        </Field>
        <Field Name="Amount">
          <DataField>Amount</DataField>
          <rd:TypeName>System.Decimal</rd:TypeName>
        </Field>
        <Field Name="OrderDate">
          <DataField>OrderDate</DataField>
          <rd:TypeName>System.DateTime</rd:TypeName>
        </Field>
        <Field Name="Sku">
          <DataField>Sku</DataField>
          <rd:TypeName>System.String</rd:TypeName>
        </Field>
      </Fields>
    </DataSet>
    <DataSet Name="Bins">
      <Query>
        <DataSourceName>Warehouse</DataSourceName>
        <CommandText>SELECT Sku, Bin FROM Bins</CommandText>
      </Query>
      <Fields>
        <Field Name="Sku"><DataField>Sku</DataField></Field>
        <Field Name="Bin"><DataField>Bin</DataField><rd:TypeName>System.Int16</rd:TypeName></Field>
      </Fields>
    </DataSet>
    <DataSet Name="Regions">
      <Query>
        <DataSourceName>Warehouse</DataSourceName>
        <CommandText>SELECT Code, Label FROM Regions</CommandText>
      </Query>
      <Fields>
        <Field Name="Code"><DataField>Code</DataField></Field>
        <Field Name="Label"><DataField>Label</DataField></Field>
      </Fields>
    </DataSet>
  </DataSets>
  <ReportParameters>
    <ReportParameter Name="Region">
      <DataType>String</DataType>
      <DefaultValue>
        <Values>
          <Value>North</Value>
        </Values>
      </DefaultValue>
      <Prompt>Sales region</Prompt>
      <ValidValues>
        <DataSetReference>
          <DataSetName>Regions</DataSetName>
          <ValueField>Code</ValueField>
          <LabelField>Label</LabelField>
        </DataSetReference>
      </ValidValues>
    </ReportParameter>
    <ReportParameter Name="Status">
      <DataType>String</DataType>
      <MultiValue>true</MultiValue>
      <ValidValues>
        <ParameterValues>
          <ParameterValue>
            <Value>open</Value>
            <Label>Open</Label>
          </ParameterValue>
          <ParameterValue>
            <Value>closed</Value>
          </ParameterValue>
        </ParameterValues>
      </ValidValues>
    </ReportParameter>
    <ReportParameter Name="Cutoff">
      <DataType>DateTime</DataType>
      <Nullable>true</Nullable>
      <DefaultValue>
        <Values>
          <Value xsi:nil="true" />
        </Values>
      </DefaultValue>
    </ReportParameter>
  </ReportParameters>
  <ReportSections>
    <ReportSection>
      <Body>
        <ReportItems>
          <Tablix Name="OrderTable">
            <TablixBody>
              <TablixColumns>
                <TablixColumn><Width>0.5in</Width></TablixColumn>
                <TablixColumn><Width>2in</Width></TablixColumn>
                <TablixColumn><Width>1.25in</Width></TablixColumn>
                <TablixColumn></TablixColumn>
                <TablixColumn><Width>1in</Width></TablixColumn>
              </TablixColumns>
              <TablixRows>
                <TablixRow>
                  <Height>0.25in</Height>
                  <TablixCells>
                    <TablixCell><CellContents><Textbox Name="HdrNo"><Paragraphs><Paragraph><TextRuns><TextRun><Value>#</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                    <TablixCell>
                      <CellContents>
                        <Textbox Name="HdrCustomer">
                          <Paragraphs>
                            <Paragraph>
                              <TextRuns>
                                <TextRun>
                                  <Value>Customer</Value>
                                  <Style>
                                    <FontSize>11pt</FontSize>
                                    <FontWeight>Bold</FontWeight>
                                    <Color>White</Color>
                                  </Style>
                                </TextRun>
                              </TextRuns>
                              <Style><TextAlign>Left</TextAlign></Style>
                            </Paragraph>
                          </Paragraphs>
                          <UserSort>
                            <SortExpression>=Fields!Customer.Value</SortExpression>
                          </UserSort>
                          <Style>
                            <BackgroundColor>SteelBlue</BackgroundColor>
                            <VerticalAlign>Middle</VerticalAlign>
                          </Style>
                        </Textbox>
                      </CellContents>
                    </TablixCell>
                    <TablixCell><CellContents><Textbox Name="HdrAmount"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Net amount</Value></TextRun></TextRuns></Paragraph></Paragraphs><UserSort><SortExpression>=Fields!Amount.Value</SortExpression></UserSort></Textbox></CellContents></TablixCell>
                    <TablixCell><CellContents><Textbox Name="HdrBin"><Paragraphs><Paragraph><TextRuns><TextRun><Value>Bin</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                    <TablixCell><CellContents><Textbox Name="HdrLabel"><Paragraphs><Paragraph><TextRuns><TextRun><Value>="Order " &amp; Fields!Id.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                  </TablixCells>
                </TablixRow>
                <TablixRow>
                  <Height>0.25in</Height>
                  <TablixCells>
                    <TablixCell><CellContents><Textbox Name="RowNo"><Paragraphs><Paragraph><TextRuns><TextRun><Value>=RowNumber("Orders")</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                    <TablixCell>
                      <CellContents>
                        <Textbox Name="Customer">
                          <Paragraphs><Paragraph><TextRuns><TextRun><Value>=Fields!Customer.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs>
                          <ActionInfo>
                            <Actions>
                              <Action>
                                <Drillthrough>
                                  <ReportName>/Sales/CustomerDetail</ReportName>
                                  <Parameters>
                                    <Parameter Name="CustomerName">
                                      <Value>=Fields!Customer.Value</Value>
                                    </Parameter>
                                    <Parameter Name="Region">
                                      <Value>=Parameters!Region.Value</Value>
                                    </Parameter>
                                  </Parameters>
                                </Drillthrough>
                              </Action>
                            </Actions>
                          </ActionInfo>
                        </Textbox>
                      </CellContents>
                    </TablixCell>
                    <TablixCell>
                      <CellContents>
                        <Textbox Name="NetAmount">
                          <Paragraphs>
                            <Paragraph>
                              <TextRuns>
                                <TextRun>
                                  <Value>=Fields!Amount.Value - 1</Value>
                                  <Style><Format>N2</Format></Style>
                                </TextRun>
                              </TextRuns>
                              <Style><TextAlign>Right</TextAlign></Style>
                            </Paragraph>
                          </Paragraphs>
                        </Textbox>
                      </CellContents>
                    </TablixCell>
                    <TablixCell><CellContents><Textbox><Paragraphs><Paragraph><TextRuns><TextRun><Value>=Lookup(Fields!Sku.Value, Fields!Sku.Value, Fields!Bin.Value, "Bins")</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                    <TablixCell><CellContents><Textbox Name="Label"><Paragraphs><Paragraph><TextRuns><TextRun><Value>="Order " &amp; Fields!Id.Value</Value></TextRun></TextRuns></Paragraph></Paragraphs></Textbox></CellContents></TablixCell>
                  </TablixCells>
                </TablixRow>
              </TablixRows>
            </TablixBody>
            <DataSetName>Orders</DataSetName>
          </Tablix>
        </ReportItems>
      </Body>
    </ReportSection>
  </ReportSections>
</Report>
"#;

/// Wraps the given body elements in a Report root using `namespace`.
pub fn report_with(namespace: &str, body: &str) -> String {
    format!(r#"<Report xmlns="{}">{}</Report>"#, namespace, body)
}

/// A single datasource plus the given datasets, in the 2016 namespace.
pub fn report_with_datasets(datasets: &str) -> String {
    report_with(
        NS_2016,
        &format!(
            r#"<DataSources><DataSource Name="Main"><DataSourceReference>main</DataSourceReference></DataSource></DataSources><DataSets>{}</DataSets>"#,
            datasets
        ),
    )
}

/// A minimal dataset with the given name and command text.
pub fn dataset(name: &str, command: &str) -> String {
    format!(
        r#"<DataSet Name="{}"><Query><DataSourceName>Main</DataSourceName><CommandText>{}</CommandText></Query><Fields><Field Name="Id"><DataField>Id</DataField></Field></Fields></DataSet>"#,
        name, command
    )
}
