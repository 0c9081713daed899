//! End-to-end pipeline tests: ingestion, consistency, failure compensation,
//! cancellation, and question answering over in-memory backends.

use ragflow_knowledge::embeddings::providers::mock::MockEmbedding;
use ragflow_knowledge::embeddings::{EmbeddingProvider, EmbeddingService};
use ragflow_knowledge::files::MemoryFileStore;
use ragflow_knowledge::index::{IndexHit, InMemoryVectorIndex, VectorIndex};
use ragflow_knowledge::store::{InMemoryMetadataStore, MetadataStore};
use ragflow_knowledge::types::VectorRecord;
use ragflow_knowledge::{AnswerOrchestrator, Document, DocumentStatus, KnowledgeBuilder, Retriever};
use ragflow_core::{AppError, AppResult};
use ragflow_llm::providers::mock::MockClient;
use ragflow_prompt::{PromptBuilder, NO_CONTEXT_MARKER};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

const CAT_TEXT: &str = "A cat sat on a mat. The cat watched birds through the window. \
Later the cat chased a ball of yarn across the floor.";

const DB_TEXT: &str = "Database indexes speed up query execution. A btree index keeps \
keys sorted for range scans. Vacuum reclaims storage occupied by dead tuples.";

struct Pipeline {
    store: Arc<InMemoryMetadataStore>,
    index: Arc<InMemoryVectorIndex>,
    files: Arc<MemoryFileStore>,
    embedder: EmbeddingService,
    builder: Arc<KnowledgeBuilder>,
}

fn pipeline(chunk_size: usize, chunk_overlap: usize) -> Pipeline {
    let store = Arc::new(InMemoryMetadataStore::new());
    let index = Arc::new(InMemoryVectorIndex::new());
    let files = Arc::new(MemoryFileStore::new());
    let embedder = EmbeddingService::new(Arc::new(MockEmbedding::new(128)), 8);

    let builder = Arc::new(KnowledgeBuilder::new(
        store.clone() as Arc<dyn MetadataStore>,
        index.clone() as Arc<dyn VectorIndex>,
        embedder.clone(),
        files.clone(),
        chunk_size,
        chunk_overlap,
    ));

    Pipeline {
        store,
        index,
        files,
        embedder,
        builder,
    }
}

impl Pipeline {
    async fn ingest(&self, file_name: &str, content: &str) -> Document {
        let storage_ref = self.files.put(file_name, content.as_bytes().to_vec());
        let doc = self
            .builder
            .register_document(file_name, &storage_ref, content.len() as u64)
            .unwrap();
        self.builder.ingest_document(&doc.id).await.unwrap()
    }

    fn retriever(&self) -> Retriever {
        Retriever::new(
            self.index.clone() as Arc<dyn VectorIndex>,
            self.store.clone() as Arc<dyn MetadataStore>,
            self.embedder.clone(),
            0.0,
        )
    }
}

#[tokio::test]
async fn test_completed_document_is_consistent() {
    let p = pipeline(60, 10);
    let doc = p.ingest("cats.txt", CAT_TEXT).await;

    assert_eq!(doc.status, DocumentStatus::Completed);
    assert!(doc.chunk_count > 1);
    assert!(doc.error_message.is_none());

    let chunks = p.store.chunks_for_document(&doc.id).unwrap();
    assert_eq!(chunks.len(), doc.chunk_count as usize);
    assert_eq!(p.index.count_for_document(&doc.id), chunks.len());

    // Sequence indices are dense and 0-based; every chunk carries its vector.
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.sequence_index, i as u32);
        assert!(chunk.embedding.is_some());
    }
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let p = pipeline(60, 10);
    let doc = p.ingest("cats.txt", CAT_TEXT).await;

    let snapshot: BTreeMap<u32, String> = p
        .store
        .chunks_for_document(&doc.id)
        .unwrap()
        .into_iter()
        .map(|c| (c.sequence_index, c.text))
        .collect();
    let vector_count = p.index.count_for_document(&doc.id);

    p.builder.queue_reingestion(&doc.id).unwrap();
    let rebuilt = p.builder.ingest_document(&doc.id).await.unwrap();

    assert_eq!(rebuilt.status, DocumentStatus::Completed);
    assert_eq!(rebuilt.chunk_count, doc.chunk_count);

    let after: BTreeMap<u32, String> = p
        .store
        .chunks_for_document(&doc.id)
        .unwrap()
        .into_iter()
        .map(|c| (c.sequence_index, c.text))
        .collect();

    // Same chunk texts at the same positions, and no duplicated records.
    assert_eq!(after, snapshot);
    assert_eq!(p.index.count_for_document(&doc.id), vector_count);
    assert_eq!(p.index.len(), vector_count);
}

#[tokio::test]
async fn test_reingestion_requires_terminal_status() {
    let p = pipeline(500, 50);
    let doc = p.ingest("cats.txt", CAT_TEXT).await;

    // A completed document cannot be rebuilt without re-queueing first.
    assert!(p.builder.ingest_document(&doc.id).await.is_err());

    p.builder.queue_reingestion(&doc.id).unwrap();
    assert!(p.builder.ingest_document(&doc.id).await.is_ok());
}

#[tokio::test]
async fn test_register_rejects_unsupported_format() {
    let p = pipeline(500, 50);
    let result = p.builder.register_document("photo.png", "files/photo.png", 1024);
    assert!(matches!(result, Err(AppError::Parse(_))));
    assert!(p.store.list_documents(None).unwrap().is_empty());
}

#[tokio::test]
async fn test_retrieval_ranks_relevant_document_first() {
    let p = pipeline(500, 50);
    let cats = p.ingest("cats.txt", CAT_TEXT).await;
    p.ingest("databases.txt", DB_TEXT).await;

    let results = p
        .retriever()
        .retrieve("What did the cat chase?", 1)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document_id, cats.id);
    assert_eq!(results[0].file_name, "cats.txt");
    assert!(results[0].text.contains("cat"));
}

#[tokio::test]
async fn test_retrieval_skips_unfinished_documents() {
    let p = pipeline(500, 50);
    let cats = p.ingest("cats.txt", CAT_TEXT).await;

    // Simulate an index entry whose document never completed: a pending
    // document with a perfectly matching vector must not be surfaced.
    let pending = p
        .store
        .create_document("draft.txt", "files/draft.txt", 10)
        .unwrap();
    let query = p.embedder.embed("What did the cat chase?").await.unwrap();
    p.index
        .add(&[VectorRecord {
            chunk_id: "draft-chunk".to_string(),
            document_id: pending.id.clone(),
            vector: query,
        }])
        .unwrap();

    let results = p
        .retriever()
        .retrieve("What did the cat chase?", 5)
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.document_id == cats.id));
}

#[tokio::test]
async fn test_delete_cascades_across_stores() {
    let p = pipeline(60, 10);
    let cats = p.ingest("cats.txt", CAT_TEXT).await;
    let dbs = p.ingest("databases.txt", DB_TEXT).await;

    assert!(p.builder.delete_document(&cats.id).unwrap());

    assert!(p.store.get_document(&cats.id).unwrap().is_none());
    assert!(p.store.chunks_for_document(&cats.id).unwrap().is_empty());
    assert_eq!(p.index.count_for_document(&cats.id), 0);

    // The other document is untouched, and a second delete is a no-op.
    assert!(p.store.get_document(&dbs.id).unwrap().is_some());
    assert!(p.index.count_for_document(&dbs.id) > 0);
    assert!(!p.builder.delete_document(&cats.id).unwrap());

    let results = p.retriever().retrieve("cat", 5).await.unwrap();
    assert!(results.iter().all(|r| r.document_id == dbs.id));
}

/// Index wrapper that persists a partial batch and then fails, exercising
/// the builder's compensation path.
struct FailingIndex {
    inner: InMemoryVectorIndex,
    fail_next_add: AtomicBool,
}

impl FailingIndex {
    fn new() -> Self {
        Self {
            inner: InMemoryVectorIndex::new(),
            fail_next_add: AtomicBool::new(true),
        }
    }
}

impl VectorIndex for FailingIndex {
    fn add(&self, records: &[VectorRecord]) -> AppResult<()> {
        if self.fail_next_add.swap(false, Ordering::SeqCst) {
            let partial = &records[..records.len().min(2)];
            self.inner.add(partial)?;
            return Err(AppError::IndexWrite("simulated index outage".to_string()));
        }
        self.inner.add(records)
    }

    fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<IndexHit>> {
        self.inner.search(query, top_k)
    }

    fn delete_by_document(&self, document_id: &str) -> AppResult<()> {
        self.inner.delete_by_document(document_id)
    }

    fn clear(&self) -> AppResult<()> {
        self.inner.clear()
    }
}

#[tokio::test]
async fn test_partial_failure_is_compensated() {
    let store = Arc::new(InMemoryMetadataStore::new());
    let index = Arc::new(FailingIndex::new());
    let files = Arc::new(MemoryFileStore::new());
    let embedder = EmbeddingService::new(Arc::new(MockEmbedding::new(128)), 8);

    let builder = KnowledgeBuilder::new(
        store.clone() as Arc<dyn MetadataStore>,
        index.clone() as Arc<dyn VectorIndex>,
        embedder,
        files.clone(),
        60,
        10,
    );

    let storage_ref = files.put("cats.txt", CAT_TEXT.as_bytes().to_vec());
    let doc = builder
        .register_document("cats.txt", &storage_ref, CAT_TEXT.len() as u64)
        .unwrap();

    let err = builder.ingest_document(&doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::IndexWrite(_)));

    // Both stores rolled back; the failure cause is recorded.
    let failed = store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert_eq!(failed.chunk_count, 0);
    assert!(failed
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("simulated index outage"));
    assert!(store.chunks_for_document(&doc.id).unwrap().is_empty());
    assert_eq!(index.inner.count_for_document(&doc.id), 0);

    // A clean retry from the failed state succeeds.
    builder.queue_reingestion(&doc.id).unwrap();
    let rebuilt = builder.ingest_document(&doc.id).await.unwrap();
    assert_eq!(rebuilt.status, DocumentStatus::Completed);
    assert_eq!(
        index.inner.count_for_document(&doc.id),
        rebuilt.chunk_count as usize
    );
}

/// Store wrapper that rejects the next `Completed` transition, exercising
/// the finalize step of the build.
struct FlakyFinalizeStore {
    inner: InMemoryMetadataStore,
    fail_next_complete: AtomicBool,
}

impl FlakyFinalizeStore {
    fn new() -> Self {
        Self {
            inner: InMemoryMetadataStore::new(),
            fail_next_complete: AtomicBool::new(true),
        }
    }
}

impl MetadataStore for FlakyFinalizeStore {
    fn create_document(
        &self,
        file_name: &str,
        storage_ref: &str,
        file_size: u64,
    ) -> AppResult<ragflow_knowledge::Document> {
        self.inner.create_document(file_name, storage_ref, file_size)
    }

    fn get_document(&self, document_id: &str) -> AppResult<Option<ragflow_knowledge::Document>> {
        self.inner.get_document(document_id)
    }

    fn list_documents(
        &self,
        status: Option<DocumentStatus>,
    ) -> AppResult<Vec<ragflow_knowledge::Document>> {
        self.inner.list_documents(status)
    }

    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        chunk_count: Option<u32>,
        error_message: Option<String>,
    ) -> AppResult<ragflow_knowledge::Document> {
        if status == DocumentStatus::Completed
            && self.fail_next_complete.swap(false, Ordering::SeqCst)
        {
            return Err(AppError::MetadataWrite(
                "simulated store outage".to_string(),
            ));
        }
        self.inner
            .update_status(document_id, status, chunk_count, error_message)
    }

    fn insert_chunks(&self, chunks: &[ragflow_knowledge::Chunk]) -> AppResult<()> {
        self.inner.insert_chunks(chunks)
    }

    fn get_chunk(&self, chunk_id: &str) -> AppResult<Option<ragflow_knowledge::Chunk>> {
        self.inner.get_chunk(chunk_id)
    }

    fn chunks_for_document(&self, document_id: &str) -> AppResult<Vec<ragflow_knowledge::Chunk>> {
        self.inner.chunks_for_document(document_id)
    }

    fn delete_chunks_for_document(&self, document_id: &str) -> AppResult<usize> {
        self.inner.delete_chunks_for_document(document_id)
    }

    fn delete_document(&self, document_id: &str) -> AppResult<bool> {
        self.inner.delete_document(document_id)
    }
}

#[tokio::test]
async fn test_failed_completion_write_is_compensated() {
    let store = Arc::new(FlakyFinalizeStore::new());
    let index = Arc::new(InMemoryVectorIndex::new());
    let files = Arc::new(MemoryFileStore::new());
    let embedder = EmbeddingService::new(Arc::new(MockEmbedding::new(128)), 8);

    let builder = KnowledgeBuilder::new(
        store.clone() as Arc<dyn MetadataStore>,
        index.clone() as Arc<dyn VectorIndex>,
        embedder,
        files.clone(),
        60,
        10,
    );

    let storage_ref = files.put("cats.txt", CAT_TEXT.as_bytes().to_vec());
    let doc = builder
        .register_document("cats.txt", &storage_ref, CAT_TEXT.len() as u64)
        .unwrap();

    let err = builder.ingest_document(&doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::MetadataWrite(_)));

    // A failed finalize must not strand the document in Processing with
    // live records: it ends Failed with the cause, both stores clean, and
    // stays re-queueable.
    let failed = store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert_eq!(failed.chunk_count, 0);
    assert!(failed
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("simulated store outage"));
    assert!(store.chunks_for_document(&doc.id).unwrap().is_empty());
    assert_eq!(index.count_for_document(&doc.id), 0);

    builder.queue_reingestion(&doc.id).unwrap();
    let rebuilt = builder.ingest_document(&doc.id).await.unwrap();
    assert_eq!(rebuilt.status, DocumentStatus::Completed);
    assert_eq!(
        index.count_for_document(&doc.id),
        rebuilt.chunk_count as usize
    );
}

/// Embedding provider that parks inside `embed_batch` until released,
/// letting a test act while a build is in flight.
struct GatedEmbedding {
    inner: MockEmbedding,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for GatedEmbedding {
    fn provider_name(&self) -> &str {
        "gated-mock"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.embed_batch(texts).await
    }
}

#[tokio::test]
async fn test_delete_during_build_cancels_it() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let store = Arc::new(InMemoryMetadataStore::new());
    let index = Arc::new(InMemoryVectorIndex::new());
    let files = Arc::new(MemoryFileStore::new());
    let embedder = EmbeddingService::new(
        Arc::new(GatedEmbedding {
            inner: MockEmbedding::new(128),
            entered: entered.clone(),
            release: release.clone(),
        }),
        64,
    );

    let builder = Arc::new(KnowledgeBuilder::new(
        store.clone() as Arc<dyn MetadataStore>,
        index.clone() as Arc<dyn VectorIndex>,
        embedder,
        files.clone(),
        60,
        10,
    ));

    let storage_ref = files.put("cats.txt", CAT_TEXT.as_bytes().to_vec());
    let doc = builder
        .register_document("cats.txt", &storage_ref, CAT_TEXT.len() as u64)
        .unwrap();

    let task = {
        let builder = builder.clone();
        let document_id = doc.id.clone();
        tokio::spawn(async move { builder.ingest_document(&document_id).await })
    };

    // Wait until the build is parked mid-embedding, delete out from under
    // it, then let it resume into the cancellation guard.
    entered.notified().await;
    assert!(builder.delete_document(&doc.id).unwrap());
    release.notify_one();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(AppError::Cancelled(_))));

    // Nothing resurrected after the cancelled build unwound.
    assert!(store.get_document(&doc.id).unwrap().is_none());
    assert!(store.chunks_for_document(&doc.id).unwrap().is_empty());
    assert_eq!(index.count_for_document(&doc.id), 0);
}

#[tokio::test]
async fn test_ask_end_to_end() {
    let p = pipeline(500, 50);
    p.ingest("cats.txt", CAT_TEXT).await;
    p.ingest("databases.txt", DB_TEXT).await;

    let client = Arc::new(MockClient::new("The cat chased a ball of yarn."));
    let orchestrator = AnswerOrchestrator::new(
        p.retriever(),
        PromptBuilder::new(8000),
        client.clone(),
        "mock-model",
        5,
        0.7,
        2000,
    );

    let answer = orchestrator
        .ask("What did the cat chase?", Some(1))
        .await
        .unwrap();

    assert_eq!(answer.text, "The cat chased a ball of yarn.");
    assert_eq!(answer.model, "mock-model");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].file_name, "cats.txt");
    assert!(answer.usage.total_tokens > 0);

    // The prompt the model saw carries the citation label and the question.
    let request = client.last_request().unwrap();
    assert!(request.prompt.contains("[Source: cats.txt #0]"));
    assert!(request.prompt.contains("What did the cat chase?"));
    assert!(request.system.is_some());
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.max_tokens, Some(2000));
}

#[tokio::test]
async fn test_ask_with_empty_knowledge_base() {
    let p = pipeline(500, 50);

    let client = Arc::new(MockClient::new("The knowledge base has no answer."));
    let orchestrator = AnswerOrchestrator::new(
        p.retriever(),
        PromptBuilder::new(8000),
        client.clone(),
        "mock-model",
        5,
        0.7,
        2000,
    );

    let answer = orchestrator.ask("Anything at all?", None).await.unwrap();

    assert!(answer.sources.is_empty());
    assert_eq!(answer.text, "The knowledge base has no answer.");

    let request = client.last_request().unwrap();
    assert!(request.prompt.contains(NO_CONTEXT_MARKER));
}

#[tokio::test]
async fn test_sources_limited_to_prompt_budget() {
    let p = pipeline(60, 10);
    p.ingest("cats.txt", CAT_TEXT).await;

    // A context budget this small fits exactly one chunk; lower-ranked
    // retrieval results must not be cited.
    let client = Arc::new(MockClient::default());
    let orchestrator = AnswerOrchestrator::new(
        p.retriever(),
        PromptBuilder::new(90),
        client,
        "mock-model",
        5,
        0.7,
        2000,
    );

    let answer = orchestrator.ask("What did the cat do?", None).await.unwrap();
    assert_eq!(answer.sources.len(), 1);
}
