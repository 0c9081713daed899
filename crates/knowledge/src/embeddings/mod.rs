//! Embedding computation.
//!
//! An [`EmbeddingProvider`] turns text into fixed-dimension vectors; the
//! [`EmbeddingService`] wraps one behind batching and dimension checks.
//! Providers are resolved from configuration through a factory, so swapping
//! them changes nothing but the vector dimension.

pub mod provider;
pub mod providers;
pub mod service;

pub use provider::{create_provider, EmbeddingProvider};
pub use service::EmbeddingService;

use serde::{Deserialize, Serialize};

/// Configuration for an embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name ("mock", "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding vector dimension
    pub dimensions: usize,

    /// Custom provider endpoint, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}
