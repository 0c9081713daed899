//! Mock embedding provider.
//!
//! Hashes character trigrams and word frequencies into a fixed-dimension
//! unit vector. Not semantically meaningful like a real model, but
//! deterministic and content-dependent, which is enough for similarity
//! ranking in tests and offline development.

use crate::embeddings::provider::EmbeddingProvider;
use ragflow_core::AppResult;
use std::collections::HashMap;

const STOP_WORDS: [&str; 24] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "it",
];

pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    /// Create a new mock provider with the given vector dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        {
            *frequencies.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &frequencies {
            // Each trigram of the word contributes to one dimension.
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let slot = hash_chars(window, 37) as usize % self.dimensions;
                vector[slot] += (*freq as f32).sqrt();
            }

            // The whole word contributes once more.
            let slot = hash_chars(&chars, 31) as usize % self.dimensions;
            vector[slot] += *freq as f32;
        }

        normalize(&mut vector);
        vector
    }
}

fn hash_chars(chars: &[char], seed: u64) -> u64 {
    chars.iter().fold(0u64, |acc, &c| {
        acc.wrapping_mul(seed).wrapping_add(c as u64)
    })
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbedding {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }
}
