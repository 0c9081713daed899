//! Prompt type definitions.

use serde::{Deserialize, Serialize};

/// One retrieved chunk offered to the prompt builder, in rank order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Human-readable source label (document name + chunk index),
    /// used for citations
    pub source: String,

    /// Chunk text content
    pub text: String,
}

impl ContextChunk {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A fully assembled prompt, ready for the generative model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System instruction segment
    pub system: String,

    /// User message: labeled context segment followed by the question
    pub user: String,

    /// How many of the offered chunks made it into the context segment.
    /// Chunks are dropped lowest-ranked first, so the included set is
    /// always a prefix of the input.
    pub included: usize,
}
