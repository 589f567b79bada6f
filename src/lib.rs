//! # invoice-recon
//!
//! Rebuild clean tables and flat line-item records from the raw output of a
//! document-understanding service run over invoices.
//!
//! ## What it does
//!
//! The service returns tables as loose `(row, column, content)` cells in no
//! particular order, littered with checkbox markers such as `:unselected:`,
//! and line items as nested, typed field objects. This crate turns both into
//! something a spreadsheet or a database can take directly:
//!
//! * tables with an optional caption, a header row and equal-width data rows,
//!   numbers canonicalised to a fixed number of decimals;
//! * line-item records with a fixed column schema
//!   (`file_name`, `item_name`, `item_amount`, plus requested extras), gaps
//!   filled with a null sentinel, concatenated across a batch in upload order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! documents
//!  │
//!  ├─ 1. Extract    ExtractionService (injected)  → tables + line items
//!  ├─ 2. Group      sort cells into rows
//!  ├─ 3. Title      single-cell first row → caption
//!  ├─ 4. Normalise  strip markers, trim, fixed decimals
//!  ├─ 5. Assemble   header + rows, per-table errors
//!  ├─ 6. Project    line items → fixed-schema records
//!  └─ 7. Combine    submission order across the batch → JSON / CSV
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice_recon::{process_batch, ColumnSpec, ExtractionService, JsonFileService, ReconConfig, SourceDocument};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service: Arc<dyn ExtractionService> = Arc::new(JsonFileService);
//!     let config = ReconConfig::builder()
//!         .columns(ColumnSpec::new(["Quantity"]))
//!         .build()?;
//!     let docs = vec![SourceDocument::from_path("recorded/invoice1.pdf.json")];
//!     let output = process_batch(&service, docs, &config).await?;
//!     for record in output.combined_records() {
//!         println!("{}", serde_json::to_string(record)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `invoice-recon` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! invoice-recon = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod extraction;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RaggedRowPolicy, ReconConfig, ReconConfigBuilder};
pub use convert::{
    process_batch, process_batch_sync, process_batch_to_file, reconstruct_batch,
    reconstruct_document, write_output,
};
pub use error::{DocumentError, ReconError, ServiceError, TableError};
pub use export::{render_batch, ExportContent, ExportFormat};
pub use extraction::{ExtractionService, JsonFileService, SourceDocument};
pub use model::{Cell, ColumnSpec, ExtractionResult, FieldValue, LineItem, RawTable};
pub use output::{
    BatchOutput, BatchStats, DocumentOutput, LineItemRecord, ReconstructedTable, RecordValue,
    TableResult,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{process_stream, DocumentStream};
