//! Error types for the invoice-recon library.
//!
//! Failures come in two classes that are never mixed:
//!
//! * [`ReconError`] is **fatal**: the batch as a whole cannot be reported
//!   (bad configuration, nothing to process, every document failed, output
//!   could not be written). Returned as `Err(ReconError)` from the top-level
//!   `process_*` functions.
//!
//! * Per-item errors are **non-fatal** and stored next to the data they concern:
//!   [`TableError`] inside [`crate::output::TableResult`] when one table is
//!   malformed, [`DocumentError`] inside [`crate::output::DocumentOutput`] when
//!   the extraction service failed for one document. Siblings are unaffected.
//!
//! [`ServiceError`] is what an [`crate::extraction::ExtractionService`]
//! returns; the batch driver wraps it into a [`DocumentError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the invoice-recon library.
#[derive(Debug, Error)]
pub enum ReconError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The batch contained no documents.
    #[error("No documents to process")]
    EmptyBatch,

    /// An analyze-result payload could not be decoded.
    #[error("Invalid extraction result for '{document}': {detail}")]
    InvalidExtraction { document: String, detail: String },

    // ── Batch outcome errors ──────────────────────────────────────────────
    /// Every document failed at the service; output would be empty.
    #[error("All {total} documents failed extraction.\nFirst error: {first_error}")]
    AllDocumentsFailed { total: usize, first_error: String },

    /// Some documents succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::BatchOutput::into_result`] when the
    /// caller wants to treat any document failure as an error.
    #[error("{failed}/{total} documents failed during extraction")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Rendering records or tables to JSON/CSV failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        ReconError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(e: serde_json::Error) -> Self {
        ReconError::Export(e.to_string())
    }
}

/// A non-fatal error for a single table; the table is left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TableError {
    /// The source table carried no cells at all.
    #[error("Table {table}: no cells")]
    EmptyTable { table: usize },

    /// A data row does not match the header width.
    #[error("Table {table}: row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        table: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A non-fatal error for a single document in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The extraction service failed for this document.
    #[error("Document {index} ('{file_name}'): extraction failed: {detail}")]
    ExtractionFailed {
        index: usize,
        file_name: String,
        detail: String,
    },
}

/// Failure reported by an extraction service for one document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The document (or its recorded result) does not exist.
    #[error("'{document}' not found")]
    NotFound { document: String },

    /// The service refused or could not analyse the document.
    #[error("service rejected '{document}': {detail}")]
    Rejected { document: String, detail: String },

    /// The service answered with something that is not an analyze result.
    #[error("unreadable result for '{document}': {detail}")]
    InvalidResponse { document: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = ReconError::PartialFailure {
            success: 2,
            failed: 1,
            total: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/3"), "got: {msg}");
    }

    #[test]
    fn all_documents_failed_display() {
        let e = ReconError::AllDocumentsFailed {
            total: 2,
            first_error: "timeout".into(),
        };
        assert!(e.to_string().contains("All 2 documents"));
        assert!(e.to_string().contains("timeout"));
    }

    #[test]
    fn ragged_row_display() {
        let e = TableError::RaggedRow {
            table: 1,
            row: 3,
            expected: 2,
            found: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("Table 1"), "got: {msg}");
        assert!(msg.contains("row 3 has 3 cells, header has 2"), "got: {msg}");
    }

    #[test]
    fn document_error_display() {
        let e = DocumentError::ExtractionFailed {
            index: 0,
            file_name: "a.pdf".into(),
            detail: ServiceError::NotFound {
                document: "a.pdf".into(),
            }
            .to_string(),
        };
        assert!(e.to_string().contains("'a.pdf'"));
        assert!(e.to_string().contains("not found"));
    }
}
