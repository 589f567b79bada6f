//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ReconConfigBuilder::progress_callback`] to receive events
//! as the batch driver sends each document to the extraction service and
//! reconstructs its tables and line items.
//!
//! # Example
//!
//! ```rust
//! use invoice_recon::{BatchProgressCallback, ReconConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, tables: usize, line_items: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("document {}/{}: {} tables, {} items", index + 1, total, tables, line_items);
//!     }
//! }
//!
//! let config = ReconConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// Implementations must be `Send + Sync`: documents are processed
/// concurrently, so `on_document_*` may be called from different tasks at
/// once. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any document is sent to the service.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before the service is asked for a document.
    ///
    /// `index` is the 0-based submission position.
    fn on_document_start(&self, index: usize, total_documents: usize, file_name: &str) {
        let _ = (index, total_documents, file_name);
    }

    /// Called when a document was extracted and reconstructed.
    ///
    /// `tables` counts assembled tables only; dropped tables are not included.
    fn on_document_complete(
        &self,
        index: usize,
        total_documents: usize,
        tables: usize,
        line_items: usize,
    ) {
        let _ = (index, total_documents, tables, line_items);
    }

    /// Called when the service failed for a document.
    fn on_document_error(&self, index: usize, total_documents: usize, error: &str) {
        let _ = (index, total_documents, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReconConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
