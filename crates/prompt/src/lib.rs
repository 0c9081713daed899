//! RAG prompt assembly.
//!
//! Builds the three-segment prompt (system instruction, retrieved context,
//! user question) handed to the generative model, with rank-aware
//! truncation of the context segment.

pub mod builder;
pub mod types;

pub use builder::{PromptBuilder, NO_CONTEXT_MARKER};
pub use types::{BuiltPrompt, ContextChunk};
