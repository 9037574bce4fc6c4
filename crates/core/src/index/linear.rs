//! Linear (exact, brute-force) index variant.
//!
//! Stores chunks in an ordered `Vec` and scans it in full on every search.
//! Chunks whose embedding length disagrees with the query are skipped
//! rather than failing the whole search.

use std::sync::Mutex;

use uuid::Uuid;

use super::{validate_query, Index, SearchHit};
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::similarity::{self, Metric};

struct LinearState {
    chunks: Vec<Chunk>,
    dimension: Option<usize>,
    built: bool,
}

pub struct LinearIndex {
    state: Mutex<LinearState>,
    default_metric: Metric,
}

impl LinearIndex {
    pub fn new(default_metric: Metric) -> Self {
        Self {
            state: Mutex::new(LinearState {
                chunks: Vec::new(),
                dimension: None,
                built: false,
            }),
            default_metric,
        }
    }
}

impl Default for LinearIndex {
    fn default() -> Self {
        Self::new(Metric::Cosine)
    }
}

impl Index for LinearIndex {
    fn build(&self, chunks: Vec<Chunk>) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        let dimension = chunks.first().map(|c| c.embedding.len());
        if let Some(dim) = dimension {
            for chunk in &chunks {
                if chunk.embedding.len() != dim {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        actual: chunk.embedding.len(),
                    });
                }
            }
        }

        state.chunks = chunks;
        state.dimension = dimension;
        state.built = true;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize, metric: Option<Metric>) -> Result<Vec<SearchHit>> {
        validate_query(query, None)?;
        let metric = metric.unwrap_or(self.default_metric);
        let state = self.state.lock().unwrap();

        let mut hits: Vec<SearchHit> = state
            .chunks
            .iter()
            .filter(|c| c.embedding.len() == query.len())
            .map(|c| {
                let (distance, sim) = similarity::compute(query, &c.embedding, metric);
                SearchHit {
                    chunk: c.clone(),
                    distance,
                    similarity: sim,
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    fn add(&self, chunk: Chunk) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.chunks.iter().any(|c| c.id == chunk.id) {
            return Ok(());
        }
        if state.dimension.is_none() {
            state.dimension = Some(chunk.embedding.len());
        }
        state.chunks.push(chunk);
        state.built = true;
        Ok(())
    }

    fn remove(&self, chunk_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.chunks.retain(|c| c.id != chunk_id);
    }

    fn lookup(&self, chunk_id: Uuid) -> Option<Chunk> {
        let state = self.state.lock().unwrap();
        state.chunks.iter().find(|c| c.id == chunk_id).cloned()
    }

    fn size(&self) -> usize {
        self.state.lock().unwrap().chunks.len()
    }

    fn built(&self) -> bool {
        self.state.lock().unwrap().built
    }

    fn default_metric(&self) -> Metric {
        self.default_metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;

    fn make_chunk(embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            text: "hello".to_string(),
            embedding,
            metadata: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn search_basics_scenario() {
        let index = LinearIndex::new(Metric::Cosine);
        let c1 = make_chunk(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let c2 = make_chunk(vec![0.2, 0.3, 0.4, 0.5, 0.6]);
        let c3 = make_chunk(vec![0.8, 0.7, 0.6, 0.1, 0.2]);
        index
            .build(vec![c1.clone(), c2.clone(), c3.clone()])
            .unwrap();

        let hits = index
            .search(&[0.1, 0.2, 0.3, 0.4, 0.5], 2, None)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, c1.id);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].chunk.id, c2.id);
        assert!(hits.iter().all(|h| h.chunk.id != c3.id));
    }

    #[test]
    fn k_larger_than_indexed_count_returns_all() {
        let index = LinearIndex::new(Metric::Cosine);
        index
            .build(vec![make_chunk(vec![1.0, 0.0]), make_chunk(vec![0.0, 1.0])])
            .unwrap();
        let hits = index.search(&[1.0, 0.0], 50, None).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn empty_index_returns_empty() {
        let index = LinearIndex::new(Metric::Cosine);
        let hits = index.search(&[1.0, 0.0], 5, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_query_vector_errors() {
        let index = LinearIndex::new(Metric::Cosine);
        index.build(vec![make_chunk(vec![1.0, 0.0])]).unwrap();
        assert!(matches!(index.search(&[], 5, None), Err(Error::EmptyQuery)));
    }

    #[test]
    fn mismatched_dimension_chunks_are_skipped_not_fatal() {
        let index = LinearIndex::new(Metric::Cosine);
        index
            .build(vec![make_chunk(vec![1.0, 0.0, 0.0]), make_chunk(vec![0.5, 0.5])])
            .unwrap();
        let hits = index.search(&[1.0, 0.0], 5, None).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn add_is_idempotent_on_identical_id() {
        let index = LinearIndex::new(Metric::Cosine);
        let chunk = make_chunk(vec![1.0, 0.0]);
        index.add(chunk.clone()).unwrap();
        index.add(chunk.clone()).unwrap();
        assert_eq!(index.size(), 1);
    }

    #[test]
    fn remove_is_noop_if_absent() {
        let index = LinearIndex::new(Metric::Cosine);
        index.remove(Uuid::new_v4());
        assert_eq!(index.size(), 0);
    }

    #[test]
    fn metadata_round_trips_through_lookup() {
        let index = LinearIndex::new(Metric::Cosine);
        let mut chunk = make_chunk(vec![1.0, 0.0]);
        chunk.metadata.insert("k".to_string(), json!("v"));
        index.add(chunk.clone()).unwrap();
        let looked_up = index.lookup(chunk.id).unwrap();
        assert_eq!(looked_up.metadata.get("k").unwrap(), "v");
    }
}
