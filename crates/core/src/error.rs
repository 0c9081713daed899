//! Error types for the RagFlow pipeline.
//!
//! This module defines a unified error enum covering every failure category
//! in the system: document parsing, embedding computation, the two stores,
//! answer generation, and the ambient configuration/I/O concerns.

use thiserror::Error;

/// Unified error type for the RagFlow pipeline.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unsupported or corrupt document; fatal for the current ingestion
    #[error("Parse error: {0}")]
    Parse(String),

    /// Embedding provider error or timeout; fatal for the current build
    /// attempt, retryable via re-ingestion
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index unavailable or rejected a write; triggers compensation
    #[error("Index write error: {0}")]
    IndexWrite(String),

    /// Metadata store unavailable or rejected a write
    #[error("Metadata write error: {0}")]
    MetadataWrite(String),

    /// Generative-model error or timeout during an ask
    #[error("Generation error: {0}")]
    Generation(String),

    /// Build aborted because its document was deleted or re-queued mid-flight
    #[error("Build cancelled: {0}")]
    Cancelled(String),

    /// Knowledge base lookup and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
