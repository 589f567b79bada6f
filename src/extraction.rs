//! Boundary to the external document-understanding service.
//!
//! The service is reached only through an injected
//! [`Arc<dyn ExtractionService>`](ExtractionService) handle; the pipeline
//! stages never see it. Its answer is decoded here, once, into the closed
//! types of [`crate::model`].
//!
//! ## Analyze-result JSON
//!
//! [`ExtractionResult::from_analyze_json`] reads the service's recorded
//! analyze result. Only the parts the pipeline consumes are decoded:
//!
//! ```text
//! analyzeResult            (optional wrapper)
//!  ├─ tables[].cells[]     rowIndex, columnIndex, content
//!  └─ documents[].fields.Items.valueArray[].valueObject
//!                          field name → typed value
//! ```
//!
//! Everything else (pages, paragraphs, bounding regions, confidences) is
//! ignored.

use crate::error::{ReconError, ServiceError};
use crate::model::{Cell, ExtractionResult, FieldValue, LineItem, RawTable};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Name shown in output records (`file_name` column).
    pub file_name: String,
    pub path: PathBuf,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            path: path.into(),
        }
    }

    /// Name the document after its path's file name, minus a trailing `.json`.
    ///
    /// `recorded/invoice1.pdf.json` becomes `invoice1.pdf`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file_name = match name.strip_suffix(".json") {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => name,
        };
        Self {
            file_name,
            path: path.to_path_buf(),
        }
    }
}

/// Something that turns a document into raw tables and line items.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn analyze(&self, document: &SourceDocument) -> Result<ExtractionResult, ServiceError>;
}

/// Serves previously recorded analyze results from JSON files on disk.
///
/// `SourceDocument::path` must point at the recorded JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonFileService;

#[async_trait]
impl ExtractionService for JsonFileService {
    async fn analyze(&self, document: &SourceDocument) -> Result<ExtractionResult, ServiceError> {
        let json = tokio::fs::read_to_string(&document.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ServiceError::NotFound {
                    document: document.path.display().to_string(),
                },
                _ => ServiceError::Rejected {
                    document: document.file_name.clone(),
                    detail: e.to_string(),
                },
            })?;

        ExtractionResult::from_analyze_json(&document.file_name, &json).map_err(|e| {
            ServiceError::InvalidResponse {
                document: document.file_name.clone(),
                detail: e.to_string(),
            }
        })
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalyzeResult {
    #[serde(default, deserialize_with = "null_as_default")]
    tables: Vec<WireTable>,
    #[serde(default, deserialize_with = "null_as_default")]
    documents: Vec<WireDocument>,
}

#[derive(Debug, Deserialize)]
struct WireTable {
    #[serde(default, deserialize_with = "null_as_default")]
    cells: Vec<WireCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCell {
    row_index: usize,
    column_index: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    fields: WireDocumentFields,
}

#[derive(Debug, Default, Deserialize)]
struct WireDocumentFields {
    #[serde(rename = "Items")]
    items: Option<WireField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireField {
    value_string: Option<String>,
    value_date: Option<String>,
    value_time: Option<String>,
    value_phone_number: Option<String>,
    value_country_region: Option<String>,
    value_number: Option<f64>,
    value_integer: Option<i64>,
    value_currency: Option<WireCurrency>,
    value_array: Option<Vec<Option<WireField>>>,
    value_object: Option<BTreeMap<String, Option<WireField>>>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCurrency {
    amount: Option<f64>,
    currency_code: Option<String>,
}

/// A JSON `null` reads as the field's default, same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WireField {
    fn resolve(&self) -> FieldValue {
        if let Some(WireCurrency {
            amount: Some(amount),
            currency_code,
        }) = &self.value_currency
        {
            return FieldValue::currency(*amount, currency_code.as_deref());
        }

        let text = [
            &self.value_string,
            &self.value_date,
            &self.value_time,
            &self.value_phone_number,
            &self.value_country_region,
        ]
        .into_iter()
        .find_map(|v| v.clone());
        if let Some(text) = text {
            return FieldValue::scalar(text);
        }

        if let Some(n) = self.value_number {
            return FieldValue::scalar(n.to_string());
        }
        if let Some(n) = self.value_integer {
            return FieldValue::scalar(n.to_string());
        }

        match &self.content {
            Some(content) => FieldValue::scalar(content.clone()),
            None => FieldValue::Missing,
        }
    }

    fn to_line_item(&self) -> LineItem {
        let mut item = LineItem::new();
        if let Some(object) = &self.value_object {
            for (name, field) in object {
                let value = field.as_ref().map_or(FieldValue::Missing, WireField::resolve);
                item.insert(name.clone(), value);
            }
        }
        item
    }
}

impl From<WireAnalyzeResult> for ExtractionResult {
    fn from(wire: WireAnalyzeResult) -> Self {
        let tables = wire
            .tables
            .into_iter()
            .map(|t| {
                t.cells
                    .into_iter()
                    .map(|c| Cell::new(c.row_index, c.column_index, c.content))
                    .collect::<RawTable>()
            })
            .collect();

        let line_items = wire
            .documents
            .iter()
            .filter_map(|d| d.fields.items.as_ref())
            .filter_map(|items| items.value_array.as_ref())
            .flatten()
            .map(|entry| entry.as_ref().map(WireField::to_line_item).unwrap_or_default())
            .collect();

        ExtractionResult { tables, line_items }
    }
}

impl ExtractionResult {
    /// Decode a recorded analyze result.
    ///
    /// Accepts both the full response (`{"analyzeResult": {...}}`) and the
    /// bare inner object. `document` only labels errors.
    pub fn from_analyze_json(document: &str, json: &str) -> Result<Self, ReconError> {
        let invalid = |detail: String| ReconError::InvalidExtraction {
            document: document.to_string(),
            detail,
        };

        let mut value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        if !value.is_object() {
            return Err(invalid("expected a JSON object".to_string()));
        }
        if let Some(inner) = value.get_mut("analyzeResult") {
            value = inner.take();
        }

        let wire: WireAnalyzeResult =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        let result = ExtractionResult::from(wire);
        debug!(
            "Decoded '{}': {} tables, {} line items",
            document,
            result.tables.len(),
            result.line_items.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "status": "succeeded",
      "analyzeResult": {
        "tables": [
          {"rowCount": 2, "columnCount": 1, "cells": [
            {"rowIndex": 1, "columnIndex": 0, "content": "Subtotal", "kind": "content"},
            {"rowIndex": 0, "columnIndex": 0, "content": "Totals"}
          ]}
        ],
        "documents": [{"docType": "invoice", "fields": {
          "VendorName": {"type": "string", "valueString": "Contoso"},
          "Items": {"type": "array", "valueArray": [
            {"type": "object", "valueObject": {
              "Description": {"type": "string", "valueString": "Widget", "content": "Widget"},
              "Amount": {"type": "currency", "valueCurrency": {"amount": 10.0, "currencyCode": "USD"}},
              "Quantity": {"type": "number", "valueNumber": 3},
              "Date": {"type": "date", "valueDate": "2024-01-05", "content": "5 Jan 2024"},
              "ProductCode": {"type": "string", "content": "A-1"},
              "Unit": {"type": "string"}
            }}
          ]}
        }}]
      }
    }"#;

    #[test]
    fn decodes_tables_and_items() {
        let result = ExtractionResult::from_analyze_json("inv.pdf", SAMPLE).unwrap();

        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].cells.len(), 2);
        assert_eq!(result.tables[0].cells[0], Cell::new(1, 0, "Subtotal"));

        assert_eq!(result.line_items.len(), 1);
        let item = &result.line_items[0];
        assert_eq!(item.get("Description"), Some(&FieldValue::scalar("Widget")));
        assert_eq!(
            item.get("Amount"),
            Some(&FieldValue::currency(10.0, Some("USD")))
        );
        assert_eq!(item.get("Quantity"), Some(&FieldValue::scalar("3")));
        assert_eq!(item.get("Date"), Some(&FieldValue::scalar("2024-01-05")));
        assert_eq!(item.get("ProductCode"), Some(&FieldValue::scalar("A-1")));
        assert_eq!(item.get("Unit"), Some(&FieldValue::Missing));
    }

    #[test]
    fn null_fields_and_entries_are_missing_not_errors() {
        let json = r#"{"documents": [{"fields": {"Items": {"valueArray": [
          {"valueObject": {"Description": {"valueString": "Widget"}, "Quantity": null}},
          null,
          {"valueObject": null}
        ]}}}], "tables": [{"cells": [{"rowIndex": 0, "columnIndex": 0, "content": null}]}]}"#;
        let result = ExtractionResult::from_analyze_json("a.pdf", json).unwrap();

        assert_eq!(result.line_items.len(), 3);
        let first = &result.line_items[0];
        assert_eq!(first.get("Description"), Some(&FieldValue::scalar("Widget")));
        assert_eq!(first.get("Quantity"), Some(&FieldValue::Missing));
        assert!(result.line_items[1].fields.is_empty());
        assert!(result.line_items[2].fields.is_empty());
        assert_eq!(result.tables[0].cells[0], Cell::new(0, 0, ""));
    }

    #[test]
    fn bare_result_without_wrapper() {
        let json = r#"{"tables": [{"cells": [{"rowIndex": 0, "columnIndex": 0, "content": "x"}]}]}"#;
        let result = ExtractionResult::from_analyze_json("a", json).unwrap();
        assert_eq!(result.tables.len(), 1);
        assert!(result.line_items.is_empty());
    }

    #[test]
    fn items_from_every_document_are_concatenated() {
        let json = r#"{"documents": [
          {"fields": {"Items": {"valueArray": [{"valueObject": {"Description": {"valueString": "a"}}}]}}},
          {"fields": {}},
          {"fields": {"Items": {"valueArray": [{"valueObject": {"Description": {"valueString": "b"}}}]}}}
        ]}"#;
        let result = ExtractionResult::from_analyze_json("a", json).unwrap();
        let names: Vec<_> = result
            .line_items
            .iter()
            .filter_map(|i| i.get("Description"))
            .collect();
        assert_eq!(names, vec![&FieldValue::scalar("a"), &FieldValue::scalar("b")]);
    }

    #[test]
    fn fractional_number_keeps_its_digits() {
        let json = r#"{"documents": [{"fields": {"Items": {"valueArray": [
          {"valueObject": {"Quantity": {"valueNumber": 2.5}, "Tax": {"valueInteger": 7}}}
        ]}}}]}"#;
        let result = ExtractionResult::from_analyze_json("a", json).unwrap();
        let item = &result.line_items[0];
        assert_eq!(item.get("Quantity"), Some(&FieldValue::scalar("2.5")));
        assert_eq!(item.get("Tax"), Some(&FieldValue::scalar("7")));
    }

    #[test]
    fn malformed_json_is_invalid_extraction() {
        let err = ExtractionResult::from_analyze_json("bad.pdf", "{not json").unwrap_err();
        assert!(matches!(err, ReconError::InvalidExtraction { ref document, .. } if document == "bad.pdf"));

        let err = ExtractionResult::from_analyze_json("arr.pdf", "[]").unwrap_err();
        assert!(matches!(err, ReconError::InvalidExtraction { .. }));
    }

    #[test]
    fn cell_without_row_index_is_rejected() {
        let json = r#"{"tables": [{"cells": [{"columnIndex": 0, "content": "x"}]}]}"#;
        assert!(ExtractionResult::from_analyze_json("a", json).is_err());
    }

    #[test]
    fn source_document_name_from_path() {
        let doc = SourceDocument::from_path("recorded/invoice1.pdf.json");
        assert_eq!(doc.file_name, "invoice1.pdf");
        assert_eq!(SourceDocument::from_path("x/plain.txt").file_name, "plain.txt");
    }

    #[test]
    fn json_file_service_reports_missing_file() {
        let doc = SourceDocument::new("gone.pdf", "/definitely/not/here.json");
        let err = tokio_test::block_on(JsonFileService.analyze(&doc)).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn json_file_service_reads_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.pdf.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let doc = SourceDocument::from_path(&path);
        let result = JsonFileService.analyze(&doc).await.unwrap();
        assert_eq!(result.line_items.len(), 1);
    }
}
