//! Knowledge pipeline type definitions.

use chrono::{DateTime, Utc};
use ragflow_llm::TokenUsage;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a document.
///
/// `Pending → Processing → {Completed, Failed}`; terminal states are final
/// except for an explicit re-ingestion request, which re-enters from
/// `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
                | (Self::Completed, Self::Pending)
                | (Self::Failed, Self::Pending)
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered document and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Opaque document identifier
    pub id: String,

    /// Original file name as uploaded
    pub file_name: String,

    /// Reference into the file store holding the raw bytes
    pub storage_ref: String,

    /// Raw size in bytes
    pub file_size: u64,

    /// Lifecycle status
    pub status: DocumentStatus,

    /// Number of chunks produced by the last completed build
    pub chunk_count: u32,

    /// Failure cause from the last failed build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// Character range of a chunk within its parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

/// A bounded contiguous span of a document's text, the atomic unit of
/// embedding and retrieval. A chunk cannot outlive its document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque chunk identifier
    pub id: String,

    /// Owning document
    pub document_id: String,

    /// 0-based position within the document; dense and contiguous
    pub sequence_index: u32,

    /// Text content
    pub text: String,

    /// Span into the parsed document, for traceability
    pub char_span: CharSpan,

    /// Set when the chunk was hard-split at the size boundary instead of a
    /// sentence boundary
    #[serde(default)]
    pub hard_split: bool,

    /// Embedding vector, present once the chunk has been embedded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Vector-index-side projection of a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub chunk_id: String,
    pub document_id: String,
    pub vector: Vec<f32>,
}

/// One retrieval hit with its resolved chunk body, ordered by descending
/// relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub document_id: String,

    /// Owning document's file name, for citation labels
    pub file_name: String,

    /// Chunk position within the document, for citation labels
    pub sequence_index: u32,

    /// Chunk text content
    pub text: String,

    /// Similarity score in descending-relevance order
    pub score: f32,
}

/// A generated answer with the sources the model actually saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub text: String,

    /// The retrieval results included in the prompt, in rank order.
    /// Citations trace to what the model saw, never to discarded
    /// candidates.
    pub sources: Vec<SearchResult>,

    /// Model that produced the answer
    pub model: String,

    /// Token usage reported by the provider
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use DocumentStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Pending));
        assert!(Failed.can_transition_to(Pending));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
        assert!(!DocumentStatus::Pending.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DocumentStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");

        let parsed: DocumentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, DocumentStatus::Failed);
    }
}
