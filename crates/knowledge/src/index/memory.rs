//! In-process vector index.
//!
//! Flat cosine-similarity index: vectors are L2-normalized on insert, so a
//! dot product against a normalized query is the cosine score. Every stored
//! record carries a monotonic insertion sequence that breaks score ties in
//! favor of the most recently indexed record, keeping result order
//! deterministic.

use crate::index::{IndexHit, VectorIndex};
use crate::types::VectorRecord;
use ragflow_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::RwLock;

struct StoredRecord {
    document_id: String,
    vector: Vec<f32>,
    seq: u64,
}

#[derive(Default)]
struct IndexState {
    records: HashMap<String, StoredRecord>,
    next_seq: u64,
}

#[derive(Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<IndexState>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records currently stored.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records belonging to one document.
    pub fn count_for_document(&self, document_id: &str) -> usize {
        self.state
            .read()
            .map(|s| {
                s.records
                    .values()
                    .filter(|r| r.document_id == document_id)
                    .count()
            })
            .unwrap_or(0)
    }

    fn lock_err() -> AppError {
        AppError::IndexWrite("Vector index lock poisoned".to_string())
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn add(&self, records: &[VectorRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        for record in records {
            let mut vector = record.vector.clone();
            normalize(&mut vector);

            let seq = state.next_seq;
            state.next_seq += 1;

            // Upsert: replacing a chunk id also refreshes its recency.
            state.records.insert(
                record.chunk_id.clone(),
                StoredRecord {
                    document_id: record.document_id.clone(),
                    vector,
                    seq,
                },
            );
        }

        tracing::debug!(added = records.len(), total = state.records.len(), "Indexed vectors");
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<IndexHit>> {
        if top_k == 0 {
            return Err(AppError::Knowledge("top_k must be at least 1".to_string()));
        }

        let state = self
            .state
            .read()
            .map_err(|_| AppError::Knowledge("Vector index lock poisoned".to_string()))?;

        let mut normalized = query.to_vec();
        normalize(&mut normalized);

        let mut scored: Vec<(f32, u64, IndexHit)> = state
            .records
            .iter()
            .map(|(chunk_id, record)| {
                let score = dot(&normalized, &record.vector);
                (
                    score,
                    record.seq,
                    IndexHit {
                        chunk_id: chunk_id.clone(),
                        document_id: record.document_id.clone(),
                        score,
                    },
                )
            })
            .collect();

        // Descending score; ties go to the most recently indexed record.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.cmp(&a.1))
        });

        Ok(scored.into_iter().take(top_k).map(|(_, _, hit)| hit).collect())
    }

    fn delete_by_document(&self, document_id: &str) -> AppResult<()> {
        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        let before = state.records.len();
        state.records.retain(|_, r| r.document_id != document_id);
        let removed = before - state.records.len();

        if removed > 0 {
            tracing::debug!(document_id, removed, "Deleted vectors for document");
        }
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        let mut state = self.state.write().map_err(|_| Self::lock_err())?;
        state.records.clear();
        Ok(())
    }
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chunk_id: &str, document_id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            chunk_id: chunk_id.to_string(),
            document_id: document_id.to_string(),
            vector,
        }
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = InMemoryVectorIndex::new();
        index
            .add(&[
                record("c1", "d1", vec![1.0, 0.0]),
                record("c2", "d1", vec![0.0, 1.0]),
                record("c3", "d1", vec![0.7, 0.7]),
            ])
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].chunk_id, "c1");
        assert_eq!(hits[1].chunk_id, "c3");
        assert_eq!(hits[2].chunk_id, "c2");
        assert!(hits[0].score > hits[1].score);
        assert!(hits[1].score > hits[2].score);
    }

    #[test]
    fn test_top_k_truncation() {
        let index = InMemoryVectorIndex::new();
        index
            .add(&[
                record("c1", "d1", vec![1.0, 0.0]),
                record("c2", "d1", vec![0.9, 0.1]),
                record("c3", "d1", vec![0.8, 0.2]),
            ])
            .unwrap();

        assert_eq!(index.search(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert!(index.search(&[1.0, 0.0], 0).is_err());
    }

    #[test]
    fn test_upsert_replaces_by_chunk_id() {
        let index = InMemoryVectorIndex::new();
        index.add(&[record("c1", "d1", vec![1.0, 0.0])]).unwrap();
        index.add(&[record("c1", "d1", vec![0.0, 1.0])]).unwrap();

        assert_eq!(index.len(), 1);
        let hits = index.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].chunk_id, "c1");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_broken_by_recency() {
        let index = InMemoryVectorIndex::new();
        index.add(&[record("older", "d1", vec![1.0, 0.0])]).unwrap();
        index.add(&[record("newer", "d2", vec![1.0, 0.0])]).unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk_id, "newer");
        assert_eq!(hits[1].chunk_id, "older");
    }

    #[test]
    fn test_delete_by_document() {
        let index = InMemoryVectorIndex::new();
        index
            .add(&[
                record("c1", "d1", vec![1.0, 0.0]),
                record("c2", "d1", vec![0.5, 0.5]),
                record("c3", "d2", vec![0.0, 1.0]),
            ])
            .unwrap();

        index.delete_by_document("d1").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.count_for_document("d1"), 0);

        let hits = index.search(&[1.0, 0.0], 5).unwrap();
        assert!(hits.iter().all(|h| h.document_id == "d2"));

        // Deleting again is a no-op.
        index.delete_by_document("d1").unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_clear() {
        let index = InMemoryVectorIndex::new();
        index.add(&[record("c1", "d1", vec![1.0])]).unwrap();
        index.clear().unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 1).unwrap().is_empty());
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let index = InMemoryVectorIndex::new();
        index.add(&[record("c1", "d1", vec![0.0, 0.0])]).unwrap();
        let hits = index.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].score, 0.0);
    }
}
