//! Eager (whole-batch) reconstruction entry points.
//!
//! ## Eager vs. streaming
//!
//! This module waits for every document, then returns one [`BatchOutput`]
//! with documents back in submission order. Use
//! [`crate::stream::process_stream`] instead to receive each document as
//! soon as it is done.
//!
//! The pure functions ([`reconstruct_document`], [`reconstruct_batch`])
//! work on extraction results already in memory and never fail; the
//! `process_*` functions drive an [`ExtractionService`] first.

use crate::config::ReconConfig;
use crate::error::{DocumentError, ReconError};
use crate::export::{render_batch, ExportContent, ExportFormat};
use crate::extraction::{ExtractionService, SourceDocument};
use crate::model::ExtractionResult;
use crate::output::{BatchOutput, BatchStats, DocumentOutput};
use crate::pipeline::{assemble, line_items};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reconstruct the tables and line items of one document.
///
/// `file_name` fills the `file_name` column of every record. The returned
/// output has `index` 0; batch drivers overwrite it.
pub fn reconstruct_document(
    result: &ExtractionResult,
    file_name: &str,
    config: &ReconConfig,
) -> DocumentOutput {
    let start = Instant::now();

    let tables = assemble::assemble_tables(&result.tables, config);
    let records = line_items::project_line_items(&result.line_items, file_name, &config.columns);

    let output = DocumentOutput {
        index: 0,
        file_name: file_name.to_string(),
        tables,
        line_items: records,
        error: None,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(
        "Reconstructed '{}': {} tables ({} dropped), {} line items",
        file_name,
        output.assembled_tables().count(),
        output.dropped_table_count(),
        output.line_items.len()
    );
    output
}

/// Reconstruct a batch of in-memory extraction results, keeping their order.
///
/// An empty batch gives an empty output.
pub fn reconstruct_batch(
    documents: Vec<(String, ExtractionResult)>,
    config: &ReconConfig,
) -> BatchOutput {
    let start = Instant::now();

    let documents: Vec<DocumentOutput> = documents
        .iter()
        .enumerate()
        .map(|(index, (file_name, result))| {
            let mut output = reconstruct_document(result, file_name, config);
            output.index = index;
            output
        })
        .collect();

    finish_batch(documents, config, start)
}

/// Analyse and reconstruct a batch of documents.
///
/// At most `config.concurrency` service calls are in flight at once.
/// Results are put back into submission order before returning.
///
/// # Returns
/// `Ok(BatchOutput)` even if some documents failed at the service
/// (check `output.stats.failed_documents`, or call
/// [`BatchOutput::into_result`]).
///
/// # Errors
/// - [`ReconError::EmptyBatch`] when `documents` is empty
/// - [`ReconError::AllDocumentsFailed`] when no document could be analysed
pub async fn process_batch(
    service: &Arc<dyn ExtractionService>,
    documents: Vec<SourceDocument>,
    config: &ReconConfig,
) -> Result<BatchOutput, ReconError> {
    let start = Instant::now();
    if documents.is_empty() {
        return Err(ReconError::EmptyBatch);
    }

    let total = documents.len();
    info!(
        "Starting batch: {} documents, concurrency {}",
        total, config.concurrency
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut outputs: Vec<DocumentOutput> = stream::iter(
        documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| process_document(service, index, total, document, config)),
    )
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Completion order → submission order
    outputs.sort_by_key(|d| d.index);

    let succeeded = outputs.iter().filter(|d| d.is_success()).count();
    if succeeded == 0 {
        let first_error = outputs
            .iter()
            .find_map(|d| d.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(total, 0);
        }
        return Err(ReconError::AllDocumentsFailed { total, first_error });
    }

    let output = finish_batch(outputs, config, start);
    info!(
        "Batch complete: {}/{} documents, {} tables, {} line items, {}ms",
        output.stats.processed_documents,
        total,
        output.stats.assembled_tables,
        output.stats.line_items,
        output.stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }
    Ok(output)
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_batch_sync(
    service: &Arc<dyn ExtractionService>,
    documents: Vec<SourceDocument>,
    config: &ReconConfig,
) -> Result<BatchOutput, ReconError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReconError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_batch(service, documents, config))
}

/// Process a batch and write the exported line items to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn process_batch_to_file(
    service: &Arc<dyn ExtractionService>,
    documents: Vec<SourceDocument>,
    output_path: impl AsRef<Path>,
    format: ExportFormat,
    config: &ReconConfig,
) -> Result<BatchStats, ReconError> {
    let output = process_batch(service, documents, config).await?;
    write_output(&output, output_path, format, ExportContent::LineItems).await?;
    Ok(output.stats)
}

/// Render an already processed batch and write it atomically to `output_path`.
pub async fn write_output(
    output: &BatchOutput,
    output_path: impl AsRef<Path>,
    format: ExportFormat,
    content: ExportContent,
) -> Result<(), ReconError> {
    let rendered = render_batch(output, format, content)?;
    write_atomic(output_path.as_ref(), rendered.as_bytes()).await
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReconError> {
    let write_failed = |e: std::io::Error| ReconError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Analyse one document and reconstruct it, reporting progress either way.
pub(crate) async fn process_document(
    service: &Arc<dyn ExtractionService>,
    index: usize,
    total: usize,
    document: SourceDocument,
    config: &ReconConfig,
) -> DocumentOutput {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total, &document.file_name);
    }

    match service.analyze(&document).await {
        Ok(result) => {
            let mut output = reconstruct_document(&result, &document.file_name, config);
            output.index = index;
            output.duration_ms = start.elapsed().as_millis() as u64;
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(
                    index,
                    total,
                    output.assembled_tables().count(),
                    output.line_items.len(),
                );
            }
            output
        }
        Err(e) => {
            warn!("Document {} ('{}') failed: {}", index, document.file_name, e);
            let error = DocumentError::ExtractionFailed {
                index,
                file_name: document.file_name.clone(),
                detail: e.to_string(),
            };
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(index, total, &error.to_string());
            }
            DocumentOutput::failed(
                index,
                document.file_name,
                error,
                start.elapsed().as_millis() as u64,
            )
        }
    }
}

fn finish_batch(documents: Vec<DocumentOutput>, config: &ReconConfig, start: Instant) -> BatchOutput {
    let stats = BatchStats::from_documents(&documents, start.elapsed().as_millis() as u64);
    BatchOutput {
        columns: line_items::final_columns(&config.columns),
        documents,
        stats,
    }
}
