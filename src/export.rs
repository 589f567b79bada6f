//! JSON and CSV rendering of a batch's combined records and tables.
//!
//! Line items render as one row per record under the batch's column set;
//! [`RecordValue::Missing`](crate::output::RecordValue) is `null` in JSON and
//! an empty cell in CSV.
//!
//! Tables have per-table headers, so CSV uses a long layout with one row
//! per header cell and one per data cell:
//!
//! ```text
//! file_name,document,table,title,row,column,value
//! inv1.pdf,0,0,Totals,header,Subtotal,Subtotal
//! inv1.pdf,0,0,Totals,header,100.00,100.00
//! inv1.pdf,0,0,Totals,0,Subtotal,Tax
//! inv1.pdf,0,0,Totals,0,100.00,8.00
//! ```

use crate::error::ReconError;
use crate::output::{BatchOutput, LineItemRecord, SourcedTable};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// Which half of the batch output to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportContent {
    #[default]
    LineItems,
    Tables,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ReconError::InvalidConfig(format!(
                "unknown export format '{other}' (expected json or csv)"
            ))),
        }
    }
}

/// Pretty-printed JSON array of record objects.
pub fn records_to_json(records: &[&LineItemRecord]) -> Result<String, ReconError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// CSV with `columns` as the header row.
pub fn records_to_csv(columns: &[String], records: &[&LineItemRecord]) -> Result<String, ReconError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(record.values().map(|v| v.to_string()))?;
    }
    finish_csv(writer)
}

/// Pretty-printed JSON array of `{document_index, file_name, table_index, title, header, rows}` objects.
pub fn tables_to_json(tables: &[SourcedTable<'_>]) -> Result<String, ReconError> {
    Ok(serde_json::to_string_pretty(tables)?)
}

/// Long-format CSV.
///
/// `document` and `table` are the source indices. `row` is `header` for the
/// header cells and the 0-based data row otherwise; `column` is the header
/// label of the cell. A table without a header still gets one row with
/// empty `row`, `column` and `value` so its title is kept.
pub fn tables_to_csv(tables: &[SourcedTable<'_>]) -> Result<String, ReconError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    writer.write_record(["file_name", "document", "table", "title", "row", "column", "value"])?;

    for table in tables {
        let document_no = table.document_index.to_string();
        let table_no = table.table_index.to_string();
        let title = table.title.unwrap_or_default();
        let mut write = |row: &str, column: &str, value: &str| {
            writer.write_record([
                table.file_name,
                document_no.as_str(),
                table_no.as_str(),
                title,
                row,
                column,
                value,
            ])
        };

        if table.header.is_empty() {
            write("", "", "")?;
            continue;
        }
        for label in table.header {
            write("header", label.as_str(), label.as_str())?;
        }
        for (row_no, row) in table.rows.iter().enumerate() {
            let row_no = row_no.to_string();
            for (label, value) in table.header.iter().zip(row) {
                write(row_no.as_str(), label.as_str(), value.as_str())?;
            }
        }
    }
    finish_csv(writer)
}

/// Render one half of `output` in `format`.
pub fn render_batch(
    output: &BatchOutput,
    format: ExportFormat,
    content: ExportContent,
) -> Result<String, ReconError> {
    match (content, format) {
        (ExportContent::LineItems, ExportFormat::Json) => {
            records_to_json(&output.combined_records())
        }
        (ExportContent::LineItems, ExportFormat::Csv) => {
            records_to_csv(&output.columns, &output.combined_records())
        }
        (ExportContent::Tables, ExportFormat::Json) => tables_to_json(&output.combined_tables()),
        (ExportContent::Tables, ExportFormat::Csv) => tables_to_csv(&output.combined_tables()),
    }
}

fn finish_csv(mut writer: csv::Writer<Vec<u8>>) -> Result<String, ReconError> {
    writer.flush().map_err(|e| ReconError::Export(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Export(e.into_error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Export(format!("invalid utf-8 csv output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use crate::convert::reconstruct_batch;
    use crate::model::{Cell, ColumnSpec, ExtractionResult, FieldValue, LineItem, RawTable};
    use pretty_assertions::assert_eq;

    fn sample_batch() -> BatchOutput {
        let config = ReconConfig::builder()
            .columns(ColumnSpec::new(["Quantity"]))
            .build()
            .unwrap();
        let first = ExtractionResult {
            tables: vec![RawTable::new(vec![
                Cell::new(0, 0, "Totals"),
                Cell::new(1, 0, "Subtotal"),
                Cell::new(1, 1, "100.00"),
                Cell::new(2, 0, "Tax"),
                Cell::new(2, 1, "8"),
            ])],
            line_items: vec![LineItem::new()
                .with("Description", FieldValue::scalar("Widget, large"))
                .with("Amount", FieldValue::currency(10.0, Some("USD")))
                .with("Quantity", FieldValue::scalar("3"))],
        };
        let second = ExtractionResult {
            tables: vec![],
            line_items: vec![LineItem::new()
                .with("Description", FieldValue::scalar("Gadget"))
                .with("Amount", FieldValue::currency(5.5, None))],
        };
        reconstruct_batch(
            vec![("inv1.pdf".into(), first), ("inv2.pdf".into(), second)],
            &config,
        )
    }

    #[test]
    fn line_items_csv() {
        let csv = render_batch(&sample_batch(), ExportFormat::Csv, ExportContent::LineItems).unwrap();
        assert_eq!(
            csv,
            "file_name,item_name,item_amount,Quantity\n\
             inv1.pdf,\"Widget, large\",10,3\n\
             inv2.pdf,Gadget,5.5,\n"
        );
    }

    #[test]
    fn line_items_json_uses_null_for_missing() {
        let json = render_batch(&sample_batch(), ExportFormat::Json, ExportContent::LineItems).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["item_amount"], serde_json::json!(10.0));
        assert_eq!(value[1]["Quantity"], serde_json::Value::Null);
        assert_eq!(value[1]["file_name"], "inv2.pdf");
    }

    #[test]
    fn tables_json() {
        let json = render_batch(&sample_batch(), ExportFormat::Json, ExportContent::Tables).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["title"], "Totals");
        assert_eq!(value[0]["header"], serde_json::json!(["Subtotal", "100.00"]));
        assert_eq!(value[0]["rows"], serde_json::json!([["Tax", "8.00"]]));
    }

    #[test]
    fn tables_csv_long_layout() {
        let csv = render_batch(&sample_batch(), ExportFormat::Csv, ExportContent::Tables).unwrap();
        assert_eq!(
            csv,
            "file_name,document,table,title,row,column,value\n\
             inv1.pdf,0,0,Totals,header,Subtotal,Subtotal\n\
             inv1.pdf,0,0,Totals,header,100.00,100.00\n\
             inv1.pdf,0,0,Totals,0,Subtotal,Tax\n\
             inv1.pdf,0,0,Totals,0,100.00,8.00\n"
        );
    }

    #[test]
    fn tables_csv_keeps_tables_without_data_rows() {
        let result = ExtractionResult {
            tables: vec![
                RawTable::new(vec![
                    Cell::new(0, 0, "Totals"),
                    Cell::new(1, 0, "Subtotal"),
                    Cell::new(1, 1, "100.00"),
                ]),
                RawTable::new(vec![]),
                RawTable::new(vec![Cell::new(0, 0, "Notes")]),
            ],
            line_items: vec![],
        };
        let batch = reconstruct_batch(vec![("inv.pdf".into(), result)], &ReconConfig::default());
        assert_eq!(batch.stats.assembled_tables, 2);

        let csv = render_batch(&batch, ExportFormat::Csv, ExportContent::Tables).unwrap();
        assert_eq!(
            csv,
            "file_name,document,table,title,row,column,value\n\
             inv.pdf,0,0,Totals,header,Subtotal,Subtotal\n\
             inv.pdf,0,0,Totals,header,100.00,100.00\n\
             inv.pdf,0,2,Notes,,,\n"
        );
    }

    #[test]
    fn tables_csv_separates_documents_with_the_same_name() {
        let table = || ExtractionResult {
            tables: vec![RawTable::new(vec![
                Cell::new(0, 0, "Code"),
                Cell::new(0, 1, "Qty"),
                Cell::new(1, 0, "A"),
                Cell::new(1, 1, "1"),
            ])],
            line_items: vec![],
        };
        let batch = reconstruct_batch(
            vec![("inv.pdf".into(), table()), ("inv.pdf".into(), table())],
            &ReconConfig::default(),
        );

        let csv = render_batch(&batch, ExportFormat::Csv, ExportContent::Tables).unwrap();
        assert_eq!(
            csv,
            "file_name,document,table,title,row,column,value\n\
             inv.pdf,0,0,,header,Code,Code\n\
             inv.pdf,0,0,,header,Qty,Qty\n\
             inv.pdf,0,0,,0,Code,A\n\
             inv.pdf,0,0,,0,Qty,1.00\n\
             inv.pdf,1,0,,header,Code,Code\n\
             inv.pdf,1,0,,header,Qty,Qty\n\
             inv.pdf,1,0,,0,Code,A\n\
             inv.pdf,1,0,,0,Qty,1.00\n"
        );
    }

    #[test]
    fn format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
