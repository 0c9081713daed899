//! Similarity retrieval over the knowledge base.
//!
//! Embeds a question, queries the vector index, and resolves hits into
//! chunk bodies. Hits whose chunk or document is missing from the metadata
//! store, or whose document is not `Completed`, are dropped rather than
//! surfaced: the index may briefly lag deletes and in-flight builds, and
//! retrieval must only ever cite finished documents.

use crate::embeddings::EmbeddingService;
use crate::index::VectorIndex;
use crate::store::MetadataStore;
use crate::types::{DocumentStatus, SearchResult};
use ragflow_core::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn MetadataStore>,
    embedder: EmbeddingService,
    similarity_threshold: f32,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn MetadataStore>,
        embedder: EmbeddingService,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            index,
            store,
            embedder,
            similarity_threshold,
        }
    }

    /// Retrieve up to `top_k` results for a question, in descending
    /// relevance order. An empty result is a valid outcome, not an error.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> AppResult<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(AppError::Knowledge("top_k must be at least 1".to_string()));
        }
        if question.trim().is_empty() {
            return Err(AppError::Knowledge("Question must not be empty".to_string()));
        }

        let query = self.embedder.embed(question).await?;
        let hits = self.index.search(&query, top_k)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut results = Vec::with_capacity(hits.len());

        for hit in hits {
            if hit.score < self.similarity_threshold {
                continue;
            }
            if !seen.insert(hit.chunk_id.clone()) {
                continue;
            }

            let Some(chunk) = self.store.get_chunk(&hit.chunk_id)? else {
                debug!(chunk_id = %hit.chunk_id, "Dropping hit with no chunk record");
                continue;
            };
            let Some(document) = self.store.get_document(&chunk.document_id)? else {
                debug!(document_id = %chunk.document_id, "Dropping hit for deleted document");
                continue;
            };
            if document.status != DocumentStatus::Completed {
                debug!(
                    document_id = %document.id,
                    status = %document.status,
                    "Dropping hit for unfinished document"
                );
                continue;
            }

            results.push(SearchResult {
                chunk_id: hit.chunk_id,
                document_id: document.id,
                file_name: document.file_name,
                sequence_index: chunk.sequence_index,
                text: chunk.text,
                score: hit.score,
            });
        }

        results.truncate(top_k);
        debug!(question_len = question.len(), results = results.len(), "Retrieval done");
        Ok(results)
    }
}
