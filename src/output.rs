//! Output types: reconstructed tables, flat line-item records, per-document and
//! per-batch results.

use crate::error::{DocumentError, ReconError, TableError};
use crate::pipeline::combine::combine;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// A table rebuilt from loose cells: optional caption, header, data rows.
///
/// Every row has exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructedTable {
    pub title: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Outcome of assembling one source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResult {
    /// 0-based position of the table in the service's output for this document.
    pub table_index: usize,
    pub table: Option<ReconstructedTable>,
    pub error: Option<TableError>,
}

impl TableResult {
    pub fn assembled(table_index: usize, table: ReconstructedTable) -> Self {
        Self {
            table_index,
            table: Some(table),
            error: None,
        }
    }

    pub fn dropped(table_index: usize, error: TableError) -> Self {
        Self {
            table_index,
            table: None,
            error: Some(error),
        }
    }

    pub fn is_assembled(&self) -> bool {
        self.table.is_some()
    }
}

/// One value in a [`LineItemRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Text(String),
    Amount(f64),
    /// The null sentinel: the item did not carry this field.
    Missing,
}

impl RecordValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, RecordValue::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            RecordValue::Amount(v) => Some(*v),
            _ => None,
        }
    }
}

/// Renders the value as a CSV cell would show it; `Missing` is empty.
impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Text(s) => f.write_str(s),
            RecordValue::Amount(v) => write!(f, "{}", v),
            RecordValue::Missing => Ok(()),
        }
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordValue::Text(s) => serializer.serialize_str(s),
            RecordValue::Amount(v) => serializer.serialize_f64(*v),
            RecordValue::Missing => serializer.serialize_none(),
        }
    }
}

/// One flat line-item row: column name → value, in the batch's column order.
///
/// Serialises as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRecord {
    values: Vec<(String, RecordValue)>,
}

impl LineItemRecord {
    pub(crate) fn from_values(values: Vec<(String, RecordValue)>) -> Self {
        Self { values }
    }

    pub fn get(&self, column: &str) -> Option<&RecordValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &RecordValue> {
        self.values.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for LineItemRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Everything reconstructed from one document of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOutput {
    /// 0-based submission position in the batch.
    pub index: usize,
    pub file_name: String,
    pub tables: Vec<TableResult>,
    pub line_items: Vec<LineItemRecord>,
    /// `Some` when the extraction service failed; tables and items are then empty.
    pub error: Option<DocumentError>,
    pub duration_ms: u64,
}

impl DocumentOutput {
    pub(crate) fn failed(index: usize, file_name: String, error: DocumentError, duration_ms: u64) -> Self {
        Self {
            index,
            file_name,
            tables: Vec::new(),
            line_items: Vec::new(),
            error: Some(error),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Successfully assembled tables, in source order.
    pub fn assembled_tables(&self) -> impl Iterator<Item = &ReconstructedTable> {
        self.tables.iter().filter_map(|t| t.table.as_ref())
    }

    pub fn dropped_table_count(&self) -> usize {
        self.tables.iter().filter(|t| t.error.is_some()).count()
    }
}

/// A reconstructed table tagged with the document it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcedTable<'a> {
    /// Submission index of the source document.
    pub document_index: usize,
    pub file_name: &'a str,
    /// Position among the document's tables, counting dropped ones.
    pub table_index: usize,
    pub title: Option<&'a str>,
    pub header: &'a [String],
    pub rows: &'a [Vec<String>],
}

/// Aggregate counters for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub processed_documents: usize,
    pub failed_documents: usize,
    pub assembled_tables: usize,
    pub dropped_tables: usize,
    pub line_items: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub(crate) fn from_documents(documents: &[DocumentOutput], total_duration_ms: u64) -> Self {
        let failed = documents.iter().filter(|d| d.error.is_some()).count();
        Self {
            total_documents: documents.len(),
            processed_documents: documents.len() - failed,
            failed_documents: failed,
            assembled_tables: documents.iter().map(|d| d.assembled_tables().count()).sum(),
            dropped_tables: documents.iter().map(DocumentOutput::dropped_table_count).sum(),
            line_items: documents.iter().map(|d| d.line_items.len()).sum(),
            total_duration_ms,
        }
    }
}

/// Result of a whole batch, documents in submission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutput {
    /// Column set shared by every line-item record in the batch.
    pub columns: Vec<String>,
    pub documents: Vec<DocumentOutput>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Every document's line items, flattened in (document, item) order.
    pub fn combined_records(&self) -> Vec<&LineItemRecord> {
        combine(self.documents.iter().map(|d| d.line_items.iter()))
    }

    /// Every assembled table, flattened in (document, table) order.
    pub fn combined_tables(&self) -> Vec<SourcedTable<'_>> {
        combine(self.documents.iter().map(|d| {
            d.tables.iter().filter_map(move |result| {
                let t = result.table.as_ref()?;
                Some(SourcedTable {
                    document_index: d.index,
                    file_name: &d.file_name,
                    table_index: result.table_index,
                    title: t.title.as_deref(),
                    header: &t.header,
                    rows: &t.rows,
                })
            })
        }))
    }

    /// Treat any failed document as an error.
    pub fn into_result(self) -> Result<Self, ReconError> {
        if self.stats.failed_documents > 0 {
            return Err(ReconError::PartialFailure {
                success: self.stats.processed_documents,
                failed: self.stats.failed_documents,
                total: self.stats.total_documents,
            });
        }
        Ok(self)
    }
}
