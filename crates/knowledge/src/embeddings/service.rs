//! Embedding service.
//!
//! Wraps a provider behind batching and dimension validation. Batching
//! amortizes provider round-trips during ingestion without changing
//! observable ordering: outputs always match inputs positionally.

use crate::embeddings::provider::EmbeddingProvider;
use ragflow_core::{AppError, AppResult};
use std::sync::Arc;

#[derive(Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl EmbeddingService {
    /// Create a service over a provider. `batch_size` bounds how many texts
    /// go to the provider per call.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// The fixed vector dimension for this deployment.
    pub fn dimension(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    /// Embed many texts, in input order.
    pub async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let mut result = self.provider.embed_batch(batch).await?;
            if result.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} embeddings for a batch of {}",
                    result.len(),
                    batch.len()
                )));
            }
            for vector in &result {
                self.check_dimension(vector)?;
            }
            vectors.append(&mut result);
        }

        Ok(vectors)
    }

    fn check_dimension(&self, vector: &[f32]) -> AppResult<()> {
        let expected = self.provider.dimensions();
        if vector.len() != expected {
            return Err(AppError::Embedding(format!(
                "Provider '{}' returned a {}-dimension vector, expected {}",
                self.provider.provider_name(),
                vector.len(),
                expected
            )));
        }
        Ok(())
    }
}
