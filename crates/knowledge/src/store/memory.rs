//! In-process metadata store.

use crate::store::MetadataStore;
use crate::types::{Chunk, Document, DocumentStatus};
use chrono::Utc;
use ragflow_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct StoreState {
    documents: HashMap<String, Document>,
    chunks: HashMap<String, Chunk>,
}

#[derive(Default)]
pub struct InMemoryMetadataStore {
    state: RwLock<StoreState>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> AppError {
        AppError::MetadataWrite("Metadata store lock poisoned".to_string())
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn create_document(
        &self,
        file_name: &str,
        storage_ref: &str,
        file_size: u64,
    ) -> AppResult<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            storage_ref: storage_ref.to_string(),
            file_size,
            status: DocumentStatus::Pending,
            chunk_count: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        state.documents.insert(document.id.clone(), document.clone());

        tracing::info!(document_id = %document.id, file_name, "Registered document");
        Ok(document)
    }

    fn get_document(&self, document_id: &str) -> AppResult<Option<Document>> {
        let state = self.state.read().map_err(|_| Self::lock_err())?;
        Ok(state.documents.get(document_id).cloned())
    }

    fn list_documents(&self, status: Option<DocumentStatus>) -> AppResult<Vec<Document>> {
        let state = self.state.read().map_err(|_| Self::lock_err())?;
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        chunk_count: Option<u32>,
        error_message: Option<String>,
    ) -> AppResult<Document> {
        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        let document = state.documents.get_mut(document_id).ok_or_else(|| {
            AppError::MetadataWrite(format!("Document not found: {}", document_id))
        })?;

        if !document.status.can_transition_to(status) {
            return Err(AppError::MetadataWrite(format!(
                "Invalid status transition for document {}: {} -> {}",
                document_id, document.status, status
            )));
        }

        document.status = status;
        document.updated_at = Utc::now();
        if let Some(count) = chunk_count {
            document.chunk_count = count;
        }
        // A successful transition clears any stale failure cause.
        document.error_message = error_message;

        tracing::info!(document_id, status = %status, "Document status updated");
        Ok(document.clone())
    }

    fn insert_chunks(&self, chunks: &[Chunk]) -> AppResult<()> {
        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        for chunk in chunks {
            state.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    fn get_chunk(&self, chunk_id: &str) -> AppResult<Option<Chunk>> {
        let state = self.state.read().map_err(|_| Self::lock_err())?;
        Ok(state.chunks.get(chunk_id).cloned())
    }

    fn chunks_for_document(&self, document_id: &str) -> AppResult<Vec<Chunk>> {
        let state = self.state.read().map_err(|_| Self::lock_err())?;
        let mut chunks: Vec<Chunk> = state
            .chunks
            .values()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.sequence_index);
        Ok(chunks)
    }

    fn delete_chunks_for_document(&self, document_id: &str) -> AppResult<usize> {
        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        let before = state.chunks.len();
        state.chunks.retain(|_, c| c.document_id != document_id);
        Ok(before - state.chunks.len())
    }

    fn delete_document(&self, document_id: &str) -> AppResult<bool> {
        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        Ok(state.documents.remove(document_id).is_some())
    }
}
