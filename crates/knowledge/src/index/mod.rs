//! Vector index abstraction.
//!
//! Stores (vector, chunk-reference) pairs and answers nearest-neighbor
//! queries. Backends are resolved through a factory keyed by configuration
//! string so the similarity-search engine stays pluggable.

pub mod memory;

pub use memory::InMemoryVectorIndex;

use crate::types::VectorRecord;
use ragflow_core::{AppError, AppResult};
use std::sync::Arc;

/// One nearest-neighbor hit, before chunk-body resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub chunk_id: String,
    pub document_id: String,
    pub score: f32,
}

/// Trait for vector index backends.
///
/// All operations take `&self` and must be safe to call concurrently from
/// ingestion and query workers; backends may serialize internally. `search`
/// reads a snapshot that may lag concurrent writes, but never returns a
/// chunk id that was never added.
pub trait VectorIndex: Send + Sync {
    /// Insert records, upserting by `chunk_id`: re-adding a record with the
    /// same id replaces it.
    fn add(&self, records: &[VectorRecord]) -> AppResult<()>;

    /// Return up to `top_k` hits sorted by descending similarity, ties
    /// broken by insertion recency (most recently indexed wins).
    fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<IndexHit>>;

    /// Remove all records for a document; no-op if none exist.
    fn delete_by_document(&self, document_id: &str) -> AppResult<()>;

    /// Remove all records (administrative operation).
    fn clear(&self) -> AppResult<()>;
}

/// Create a vector index based on the backend name.
pub fn create_index(backend: &str) -> AppResult<Arc<dyn VectorIndex>> {
    match backend {
        "memory" => Ok(Arc::new(InMemoryVectorIndex::new())),
        other => Err(AppError::Config(format!(
            "Unknown vector index backend: '{}'. Supported backends: memory",
            other
        ))),
    }
}
