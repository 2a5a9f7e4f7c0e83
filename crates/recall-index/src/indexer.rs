//! Incremental reconciliation of document operations against the index.
//!
//! `Update` and `Delete` first resolve every chunk-derived entry for the
//! document through a `document_id` metadata filter and remove it, so a
//! document edit can never leave stale chunks behind. Operations in one
//! batch are independent: a failing document lands in the report and the
//! rest proceed.
//!
//! The delete-then-insert pair for an `Update` is a single logical unit
//! only within one `apply` call. Concurrent `apply` calls touching the
//! same document id are not safe and require caller-side serialization.

use std::sync::Arc;

use recall_chunk::Chunker;
use recall_core::cancel::CancelToken;
use recall_core::error::{EngineError, Result};
use recall_core::predicate::Predicate;
use recall_core::traits::{EmbeddingClient, VectorIndex};
use recall_core::types::{
    DocOperation, Document, FailedOperation, IndexEntry, IndexerReport, MetaValue,
};

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Documents per sub-batch; larger operation lists are split
    /// transparently.
    pub max_batch_docs: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { max_batch_docs: 64 }
    }
}

pub struct IncrementalIndexer<I: VectorIndex> {
    index: Arc<I>,
    embedder: Arc<dyn EmbeddingClient>,
    chunker: Chunker,
    config: IndexerConfig,
}

impl<I: VectorIndex> IncrementalIndexer<I> {
    pub fn new(
        index: Arc<I>,
        embedder: Arc<dyn EmbeddingClient>,
        chunker: Chunker,
        config: IndexerConfig,
    ) -> Result<Self> {
        if embedder.dim() != index.dim() {
            return Err(EngineError::DimensionMismatch {
                expected: index.dim(),
                got: embedder.dim(),
            });
        }
        if config.max_batch_docs == 0 {
            return Err(EngineError::InvalidInput("max_batch_docs must be positive".to_string()));
        }
        Ok(Self { index, embedder, chunker, config })
    }

    /// Apply a batch of document operations. Cancellation is checked
    /// between documents; committed work stays committed and the report
    /// says how far the batch got.
    pub fn apply(&self, operations: Vec<DocOperation>, cancel: &CancelToken) -> IndexerReport {
        let mut report = IndexerReport::default();

        for batch in operations.chunks(self.config.max_batch_docs) {
            tracing::debug!(docs = batch.len(), "applying indexer sub-batch");
            for op in batch {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    return report;
                }
                let document_id = op.document_id().to_string();
                match self.apply_one(op) {
                    Ok(()) => match op {
                        DocOperation::Insert(_) => report.inserted += 1,
                        DocOperation::Update(_) => report.updated += 1,
                        DocOperation::Delete { .. } => report.deleted += 1,
                    },
                    Err(err) => {
                        tracing::warn!(document_id = %document_id, error = %err, "document operation failed");
                        report.failed.push(FailedOperation { document_id, error: err.to_string() });
                    }
                }
            }
        }

        report
    }

    fn apply_one(&self, op: &DocOperation) -> Result<()> {
        match op {
            DocOperation::Insert(doc) => self.index_document(doc),
            DocOperation::Update(doc) => {
                self.remove_chunks(&doc.id)?;
                self.index_document(doc)
            }
            DocOperation::Delete { document_id } => {
                self.remove_chunks(document_id)?;
                Ok(())
            }
        }
    }

    /// Remove every chunk entry derived from the document. Resolving ids
    /// through the metadata filter rather than recomputing chunk ids also
    /// covers documents indexed under an older chunker configuration.
    fn remove_chunks(&self, document_id: &str) -> Result<usize> {
        let existing = self.index.find_ids(&Predicate::eq("document_id", document_id))?;
        if existing.is_empty() {
            return Ok(0);
        }
        self.index.delete(&existing)
    }

    fn index_document(&self, doc: &Document) -> Result<()> {
        let chunks = self.chunker.chunk_vec(&doc.id, &doc.content);
        if chunks.is_empty() {
            tracing::debug!(document_id = %doc.id, "document produced no chunks");
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(EngineError::Unavailable(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let mut metadata = doc.metadata.clone();
            metadata.insert("document_id".to_string(), doc.id.as_str().into());
            metadata.insert("chunk_index".to_string(), chunk.chunk_index.into());
            metadata.insert("title".to_string(), doc.title.as_str().into());
            metadata.insert("timestamp".to_string(), MetaValue::Num(doc.timestamp.timestamp() as f64));
            if let Some(section) = &chunk.section_hint {
                metadata.insert("section".to_string(), section.as_str().into());
            }
            entries.push(IndexEntry {
                id: chunk.id,
                vector,
                metadata,
                tenant_id: String::new(),
            });
        }

        self.index.upsert(entries)
    }
}
