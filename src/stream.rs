//! Streaming batch API: emit documents as they complete.
//!
//! Unlike the eager [`crate::convert::process_batch`], which returns only
//! after every document finishes, [`process_stream`] yields each
//! [`DocumentOutput`] as soon as it has been analysed and reconstructed.
//! Documents arrive in completion order; every output carries its
//! submission `index`, so sort by it if order matters.

use crate::config::ReconConfig;
use crate::convert::process_document;
use crate::error::ReconError;
use crate::extraction::{ExtractionService, SourceDocument};
use crate::output::DocumentOutput;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document outputs.
///
/// A document the service failed on is still yielded, with `error` set.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutput> + Send>>;

/// Analyse and reconstruct documents, streaming each result as it is ready.
///
/// At most `config.concurrency` service calls are in flight. Dropping the
/// stream cancels the calls still pending.
///
/// # Errors
/// [`ReconError::EmptyBatch`] when `documents` is empty.
pub fn process_stream(
    service: Arc<dyn ExtractionService>,
    documents: Vec<SourceDocument>,
    config: &ReconConfig,
) -> Result<DocumentStream, ReconError> {
    if documents.is_empty() {
        return Err(ReconError::EmptyBatch);
    }

    let total = documents.len();
    info!("Starting streaming batch: {} documents", total);

    let concurrency = config.concurrency;
    let config = config.clone();

    let s = stream::iter(documents.into_iter().enumerate().map(move |(index, document)| {
        let service = Arc::clone(&service);
        let cfg = config.clone();
        async move { process_document(&service, index, total, document, &cfg).await }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::model::ExtractionResult;
    use async_trait::async_trait;

    struct EmptyService;

    #[async_trait]
    impl ExtractionService for EmptyService {
        async fn analyze(&self, document: &SourceDocument) -> Result<ExtractionResult, ServiceError> {
            if document.file_name == "missing.pdf" {
                return Err(ServiceError::NotFound {
                    document: document.file_name.clone(),
                });
            }
            Ok(ExtractionResult::default())
        }
    }

    #[tokio::test]
    async fn yields_every_document_once() {
        let docs = vec![
            SourceDocument::new("a.pdf", "a"),
            SourceDocument::new("missing.pdf", "m"),
            SourceDocument::new("c.pdf", "c"),
        ];
        let stream = process_stream(Arc::new(EmptyService), docs, &ReconConfig::default()).unwrap();
        let mut outputs: Vec<DocumentOutput> = stream.collect().await;
        outputs.sort_by_key(|d| d.index);

        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[1].file_name, "missing.pdf");
        assert!(outputs[1].error.is_some());
        assert!(outputs[2].is_success());
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = process_stream(Arc::new(EmptyService), Vec::new(), &ReconConfig::default());
        assert!(matches!(result, Err(ReconError::EmptyBatch)));
    }
}
