//! Pipeline configuration.
//!
//! All tunables live in one explicit structure that is injected into each
//! component at construction time. Nothing reads ambient global state, which
//! keeps components testable in isolation with deterministic settings.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration for the ingestion and query pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunk texts sent to the embedding provider per round-trip
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Default number of candidates retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum total characters of retrieved context in a prompt
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Sampling temperature for answer generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens the generative model may produce per answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for embedding and generation provider calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum similarity score for a retrieved chunk to be surfaced.
    /// 0.0 disables the cutoff.
    #[serde(default)]
    pub similarity_threshold: f32,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_embedding_batch_size() -> usize {
    32
}

fn default_top_k() -> usize {
    5
}

fn default_max_context_chars() -> usize {
    8000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_batch_size: default_embedding_batch_size(),
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            similarity_threshold: 0.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }
        if self.embedding_batch_size == 0 {
            return Err(AppError::Config(
                "embedding_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
