//! Metadata store abstraction.
//!
//! Holds document records and chunk bodies. The store enforces the
//! document status state machine on every status write; callers cannot
//! skip states. Chunks are keyed by their owning document and must be
//! removed before or together with it.

pub mod memory;

pub use memory::InMemoryMetadataStore;

use crate::types::{Chunk, Document, DocumentStatus};
use ragflow_core::AppResult;

/// Trait for metadata store backends.
///
/// Implementations must apply each call atomically with respect to other
/// calls, and must reject status updates that violate
/// [`DocumentStatus::can_transition_to`].
pub trait MetadataStore: Send + Sync {
    /// Register a new document in `Pending` status and return its record.
    fn create_document(
        &self,
        file_name: &str,
        storage_ref: &str,
        file_size: u64,
    ) -> AppResult<Document>;

    /// Fetch one document, or `None` if the id is unknown.
    fn get_document(&self, document_id: &str) -> AppResult<Option<Document>>;

    /// List documents, optionally filtered by status, newest first.
    fn list_documents(&self, status: Option<DocumentStatus>) -> AppResult<Vec<Document>>;

    /// Move a document to `status`, updating `chunk_count` and
    /// `error_message` when given. Fails with `MetadataWrite` if the
    /// document is missing or the transition is not permitted.
    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        chunk_count: Option<u32>,
        error_message: Option<String>,
    ) -> AppResult<Document>;

    /// Insert chunk records for a document.
    fn insert_chunks(&self, chunks: &[Chunk]) -> AppResult<()>;

    /// Fetch one chunk, or `None` if the id is unknown.
    fn get_chunk(&self, chunk_id: &str) -> AppResult<Option<Chunk>>;

    /// All chunks of a document, ordered by `sequence_index`.
    fn chunks_for_document(&self, document_id: &str) -> AppResult<Vec<Chunk>>;

    /// Remove all chunks of a document; returns how many were removed.
    fn delete_chunks_for_document(&self, document_id: &str) -> AppResult<usize>;

    /// Remove the document record itself. Chunks must be deleted
    /// separately; this only drops the document row.
    fn delete_document(&self, document_id: &str) -> AppResult<bool>;
}
