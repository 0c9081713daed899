//! Knowledge base ingestion and retrieval pipeline.
//!
//! Turns uploaded documents into a searchable knowledge base and answers
//! natural-language questions over it:
//!
//! - **Ingestion** (write path): parse → chunk → embed → persist chunk
//!   records and vector records, driven by [`builder::KnowledgeBuilder`]
//!   through a document-status state machine with compensation on partial
//!   failure.
//! - **Query** (read path): embed the question, similarity-search the
//!   vector index, resolve chunk bodies, assemble a prompt, and synthesize
//!   an answer with cited sources via [`answer::AnswerOrchestrator`].
//!
//! The metadata store and vector index are independent systems; the
//! builder owns the cross-store consistency invariant (exactly one vector
//! record per chunk of a completed document).

pub mod answer;
pub mod builder;
pub mod chunker;
pub mod embeddings;
pub mod files;
pub mod index;
pub mod parser;
pub mod retriever;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use answer::AnswerOrchestrator;
pub use builder::KnowledgeBuilder;
pub use retriever::Retriever;
pub use types::{Answer, Chunk, Document, DocumentStatus, SearchResult, VectorRecord};
