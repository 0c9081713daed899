//! Knowledge build orchestration.
//!
//! Drives a document through parse → chunk → embed → persist, moving its
//! status `Pending → Processing → {Completed, Failed}`. The metadata store
//! and vector index are independent systems with no shared transaction, so
//! the builder owns consistency: chunk rows are written before vector
//! records, any partial failure is compensated by deleting both sides, and
//! every build starts by force-clearing leftovers from earlier attempts.
//!
//! Cancellation is cooperative. Deleting a document mid-build removes its
//! record; the builder re-reads the record before each persistence step and
//! aborts when it is gone or no longer `Processing`.

use crate::chunker;
use crate::embeddings::EmbeddingService;
use crate::files::FileStore;
use crate::index::VectorIndex;
use crate::parser;
use crate::store::MetadataStore;
use crate::types::{Chunk, Document, DocumentStatus, VectorRecord};
use ragflow_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct KnowledgeBuilder {
    store: Arc<dyn MetadataStore>,
    index: Arc<dyn VectorIndex>,
    embedder: EmbeddingService,
    files: Arc<dyn FileStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl KnowledgeBuilder {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        index: Arc<dyn VectorIndex>,
        embedder: EmbeddingService,
        files: Arc<dyn FileStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            files,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Register an uploaded file as a `Pending` document. Rejects file
    /// names whose format the parser does not support.
    pub fn register_document(
        &self,
        file_name: &str,
        storage_ref: &str,
        file_size: u64,
    ) -> AppResult<Document> {
        if !parser::is_supported(file_name) {
            return Err(AppError::Parse(format!(
                "Unsupported file type: '{}'. Supported extensions: {}",
                file_name,
                parser::supported_extensions().join(", ")
            )));
        }
        self.store.create_document(file_name, storage_ref, file_size)
    }

    /// Run the full build for one document, synchronously.
    ///
    /// On success the document ends `Completed` with its chunk count set.
    /// On failure both stores are compensated back to empty for this
    /// document and the status is set to `Failed` with the cause, unless
    /// the build was cancelled by a concurrent delete, in which case no
    /// status is written.
    pub async fn ingest_document(&self, document_id: &str) -> AppResult<Document> {
        let document = self
            .store
            .get_document(document_id)?
            .ok_or_else(|| AppError::Knowledge(format!("Document not found: {}", document_id)))?;

        // Claiming the document is the commit point for this build; any
        // status other than Pending is rejected by the state machine.
        self.store
            .update_status(document_id, DocumentStatus::Processing, None, None)?;

        info!(document_id, file_name = %document.file_name, "Starting knowledge build");

        match self.run_build(&document).await {
            Ok(updated) => {
                info!(
                    document_id,
                    chunk_count = updated.chunk_count,
                    "Knowledge build completed"
                );
                Ok(updated)
            }
            Err(err) => {
                self.compensate(document_id);

                if matches!(err, AppError::Cancelled(_)) {
                    // The record is gone or repurposed; nothing to mark.
                    warn!(document_id, "Knowledge build cancelled");
                    return Err(err);
                }

                error!(document_id, error = %err, "Knowledge build failed");
                if let Err(status_err) = self.store.update_status(
                    document_id,
                    DocumentStatus::Failed,
                    Some(0),
                    Some(err.to_string()),
                ) {
                    warn!(document_id, error = %status_err, "Could not record failure status");
                }
                Err(err)
            }
        }
    }

    /// Spawn the build onto the runtime and return immediately. Build
    /// outcomes are reported through the document status and logs.
    pub fn start_ingestion(self: &Arc<Self>, document_id: &str) {
        let builder = Arc::clone(self);
        let document_id = document_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = builder.ingest_document(&document_id).await {
                error!(document_id = %document_id, error = %err, "Background build failed");
            }
        });
    }

    /// Re-queue a terminal document for another build by moving it back to
    /// `Pending`. In-flight documents cannot be re-queued.
    pub fn queue_reingestion(&self, document_id: &str) -> AppResult<Document> {
        self.store
            .update_status(document_id, DocumentStatus::Pending, None, None)
    }

    /// Remove a document and everything derived from it.
    ///
    /// The document record goes first: a build in flight for this document
    /// observes the missing record at its next guard and aborts, so chunks
    /// and vectors deleted here cannot be resurrected by that build.
    pub fn delete_document(&self, document_id: &str) -> AppResult<bool> {
        let existed = self.store.delete_document(document_id)?;
        if !existed {
            return Ok(false);
        }

        self.index.delete_by_document(document_id)?;
        let removed = self.store.delete_chunks_for_document(document_id)?;
        info!(document_id, chunks_removed = removed, "Deleted document");
        Ok(true)
    }

    async fn run_build(&self, document: &Document) -> AppResult<Document> {
        let document_id = document.id.as_str();

        // Force-clear leftovers from a previous failed or interrupted
        // build; re-ingestion must never duplicate records.
        self.index.delete_by_document(document_id)?;
        self.store.delete_chunks_for_document(document_id)?;

        let bytes = self.files.read(&document.storage_ref)?;
        let text = parser::parse_document(&bytes, &document.file_name)?;

        let spans = chunker::chunk(&text, self.chunk_size, self.chunk_overlap);
        if spans.is_empty() {
            return Err(AppError::Knowledge(format!(
                "Document produced no chunks: {}",
                document.file_name
            )));
        }

        let texts: Vec<String> = spans.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .zip(&vectors)
            .map(|(span, vector)| Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document_id.to_string(),
                sequence_index: span.index,
                text: span.text,
                char_span: span.span,
                hard_split: span.hard_split,
                embedding: Some(vector.clone()),
            })
            .collect();

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRecord {
                chunk_id: chunk.id.clone(),
                document_id: document_id.to_string(),
                vector,
            })
            .collect();

        // Chunk rows land before vector records, so the index never refers
        // to a chunk body the store cannot resolve.
        self.ensure_processing(document_id)?;
        self.store.insert_chunks(&chunks)?;

        self.ensure_processing(document_id)?;
        self.index.add(&records)?;

        // Finalizing is a build step like any other: if the Completed write
        // fails, the error funnels into the same compensation path, so the
        // document never sticks in Processing with live records behind it.
        self.store.update_status(
            document_id,
            DocumentStatus::Completed,
            Some(chunks.len() as u32),
            None,
        )
    }

    /// Cancellation guard, checked before each store-mutating step.
    fn ensure_processing(&self, document_id: &str) -> AppResult<()> {
        match self.store.get_document(document_id)? {
            Some(doc) if doc.status == DocumentStatus::Processing => Ok(()),
            Some(doc) => Err(AppError::Cancelled(format!(
                "Build for document {} superseded; status is now {}",
                document_id, doc.status
            ))),
            None => Err(AppError::Cancelled(format!(
                "Document {} deleted during build",
                document_id
            ))),
        }
    }

    /// Roll back partial writes from an aborted build. Compensation
    /// failures are logged, not propagated; the force-clear at the next
    /// build start is the backstop.
    fn compensate(&self, document_id: &str) {
        if let Err(err) = self.index.delete_by_document(document_id) {
            warn!(document_id, error = %err, "Compensation: vector cleanup failed");
        }
        match self.store.delete_chunks_for_document(document_id) {
            Ok(removed) if removed > 0 => {
                info!(document_id, removed, "Compensation: removed partial chunks");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(document_id, error = %err, "Compensation: chunk cleanup failed");
            }
        }
    }
}
