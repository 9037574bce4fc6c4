//! KD-tree index variant.
//!
//! Partitions chunks by cycling through embedding axes (`depth mod
//! dimension`), pivoting on the per-axis median. `add`/`remove` retain the
//! full chunk set and rebuild the tree from scratch — the deliberately
//! simple choice over incremental rebalancing (see `DESIGN.md`).

use std::sync::Mutex;

use uuid::Uuid;

use super::{validate_query, Index, SearchHit};
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::similarity::{self, Metric};

struct KdNode {
    chunk: Chunk,
    axis: usize,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

struct KdTreeState {
    root: Option<Box<KdNode>>,
    retained: Vec<Chunk>,
    dimension: Option<usize>,
    built: bool,
}

pub struct KdTreeIndex {
    state: Mutex<KdTreeState>,
    default_metric: Metric,
}

impl KdTreeIndex {
    pub fn new(default_metric: Metric) -> Self {
        Self {
            state: Mutex::new(KdTreeState {
                root: None,
                retained: Vec::new(),
                dimension: None,
                built: false,
            }),
            default_metric,
        }
    }
}

impl Default for KdTreeIndex {
    fn default() -> Self {
        Self::new(Metric::Cosine)
    }
}

fn build_node(mut chunks: Vec<Chunk>, depth: usize, dimension: usize) -> Option<Box<KdNode>> {
    if chunks.is_empty() {
        return None;
    }
    let axis = depth % dimension;
    chunks.sort_by(|a, b| {
        a.embedding[axis]
            .partial_cmp(&b.embedding[axis])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let median_idx = chunks.len() / 2;
    let right_chunks = chunks.split_off(median_idx + 1);
    let pivot = chunks.pop().expect("median index is within bounds");
    let left_chunks = chunks;

    Some(Box::new(KdNode {
        chunk: pivot,
        axis,
        left: build_node(left_chunks, depth + 1, dimension),
        right: build_node(right_chunks, depth + 1, dimension),
    }))
}

/// Insert `candidate` into the sorted (ascending distance) bounded list,
/// keeping at most `k` entries and replacing the worst only if strictly
/// better once the list is full.
fn try_insert(results: &mut Vec<SearchHit>, candidate: SearchHit, k: usize) {
    if results.len() < k {
        let pos = results
            .iter()
            .position(|h| candidate.distance < h.distance)
            .unwrap_or(results.len());
        results.insert(pos, candidate);
    } else if let Some(worst) = results.last() {
        if candidate.distance < worst.distance {
            results.pop();
            let pos = results
                .iter()
                .position(|h| candidate.distance < h.distance)
                .unwrap_or(results.len());
            results.insert(pos, candidate);
        }
    }
}

fn search_node(
    node: &Option<Box<KdNode>>,
    query: &[f32],
    k: usize,
    metric: Metric,
    results: &mut Vec<SearchHit>,
) {
    let Some(node) = node else { return };

    if node.chunk.embedding.len() == query.len() {
        let (distance, similarity) = similarity::compute(query, &node.chunk.embedding, metric);
        try_insert(
            results,
            SearchHit {
                chunk: node.chunk.clone(),
                distance,
                similarity,
            },
            k,
        );
    }

    let axis = node.axis;
    let pivot_axis_value = node.chunk.embedding[axis] as f64;
    let query_axis_value = query[axis] as f64;

    let (near, far) = if query_axis_value < pivot_axis_value {
        (&node.left, &node.right)
    } else {
        (&node.right, &node.left)
    };

    search_node(near, query, k, metric, results);

    let axis_distance = (query_axis_value - pivot_axis_value).abs();
    let should_visit_far = results.len() < k
        || results
            .last()
            .map(|worst| axis_distance < worst.distance)
            .unwrap_or(true);

    if should_visit_far {
        search_node(far, query, k, metric, results);
    }
}

impl Index for KdTreeIndex {
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

        state.retained = chunks.clone();
        state.root = dimension.and_then(|dim| build_node(chunks, 0, dim));
        state.dimension = dimension;
        state.built = true;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize, metric: Option<Metric>) -> Result<Vec<SearchHit>> {
        let metric = metric.unwrap_or(self.default_metric);
        let state = self.state.lock().unwrap();
        validate_query(query, state.dimension)?;

        let mut results = Vec::with_capacity(k.min(state.retained.len()));
        search_node(&state.root, query, k, metric, &mut results);
        Ok(results)
    }

    fn add(&self, chunk: Chunk) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(dim) = state.dimension {
            if chunk.embedding.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let mut retained = state.retained.clone();
        if let Some(existing) = retained.iter_mut().find(|c| c.id == chunk.id) {
            *existing = chunk;
        } else {
            retained.push(chunk);
        }

        let dimension = state.dimension.or_else(|| retained.first().map(|c| c.embedding.len()));
        state.root = dimension.and_then(|dim| build_node(retained.clone(), 0, dim));
        state.retained = retained;
        state.dimension = dimension;
        state.built = true;
        Ok(())
    }

    fn remove(&self, chunk_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        let mut retained = state.retained.clone();
        retained.retain(|c| c.id != chunk_id);
        state.root = state
            .dimension
            .and_then(|dim| build_node(retained.clone(), 0, dim));
        state.retained = retained;
    }

    fn lookup(&self, chunk_id: Uuid) -> Option<Chunk> {
        let state = self.state.lock().unwrap();
        state.retained.iter().find(|c| c.id == chunk_id).cloned()
    }

    fn size(&self) -> usize {
        self.state.lock().unwrap().retained.len()
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
    use crate::index::linear::LinearIndex;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::collections::HashSet;

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
    fn empty_input_leaves_empty_tree_but_built() {
        let index = KdTreeIndex::new(Metric::Cosine);
        index.build(vec![]).unwrap();
        assert!(index.built());
        assert_eq!(index.size(), 0);
        assert!(index.search(&[1.0, 0.0], 3, None).unwrap().is_empty());
    }

    #[test]
    fn dimension_mismatch_at_build_is_rejected() {
        let index = KdTreeIndex::new(Metric::Cosine);
        let err = index
            .build(vec![make_chunk(vec![1.0, 0.0]), make_chunk(vec![1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn dimension_mismatch_at_search_is_rejected() {
        let index = KdTreeIndex::new(Metric::Cosine);
        index
            .build(vec![make_chunk(vec![0.1, 0.2, 0.3, 0.4, 0.5])])
            .unwrap();
        let err = index.search(&[1.0, 0.0, 0.0, 0.0], 1, None).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn equivalence_with_linear_under_cosine() {
        let chunks: Vec<Chunk> = vec![
            make_chunk(vec![0.1, 0.2, 0.3, 0.4, 0.5]),
            make_chunk(vec![0.2, 0.3, 0.4, 0.5, 0.6]),
            make_chunk(vec![0.8, 0.7, 0.6, 0.1, 0.2]),
            make_chunk(vec![-0.1, -0.2, 0.3, 0.1, 0.9]),
            make_chunk(vec![0.9, 0.1, 0.1, 0.1, 0.1]),
        ];

        let linear = LinearIndex::new(Metric::Cosine);
        linear.build(chunks.clone()).unwrap();
        let kdtree = KdTreeIndex::new(Metric::Cosine);
        kdtree.build(chunks).unwrap();

        let query = [0.15, 0.25, 0.35, 0.45, 0.55];
        let linear_ids: HashSet<Uuid> = linear
            .search(&query, 3, None)
            .unwrap()
            .into_iter()
            .map(|h| h.chunk.id)
            .collect();
        let kdtree_ids: HashSet<Uuid> = kdtree
            .search(&query, 3, None)
            .unwrap()
            .into_iter()
            .map(|h| h.chunk.id)
            .collect();
        assert_eq!(linear_ids, kdtree_ids);
    }

    #[test]
    fn equivalence_with_linear_under_euclidean() {
        let chunks: Vec<Chunk> = vec![
            make_chunk(vec![1.0, 2.0, 3.0]),
            make_chunk(vec![4.0, 1.0, 0.0]),
            make_chunk(vec![2.5, 2.5, 2.5]),
            make_chunk(vec![-1.0, -1.0, -1.0]),
            make_chunk(vec![0.0, 0.0, 0.0]),
            make_chunk(vec![10.0, 10.0, 10.0]),
        ];

        let linear = LinearIndex::new(Metric::Euclidean);
        linear.build(chunks.clone()).unwrap();
        let kdtree = KdTreeIndex::new(Metric::Euclidean);
        kdtree.build(chunks).unwrap();

        let query = [1.5, 1.5, 1.5];
        let linear_ids: HashSet<Uuid> = linear
            .search(&query, 4, None)
            .unwrap()
            .into_iter()
            .map(|h| h.chunk.id)
            .collect();
        let kdtree_ids: HashSet<Uuid> = kdtree
            .search(&query, 4, None)
            .unwrap()
            .into_iter()
            .map(|h| h.chunk.id)
            .collect();
        assert_eq!(linear_ids, kdtree_ids);
    }

    #[test]
    fn add_and_remove_rebuild_the_tree() {
        let index = KdTreeIndex::new(Metric::Cosine);
        let c1 = make_chunk(vec![1.0, 0.0]);
        let c2 = make_chunk(vec![0.0, 1.0]);
        index.build(vec![c1.clone()]).unwrap();
        index.add(c2.clone()).unwrap();
        assert_eq!(index.size(), 2);
        assert!(index.lookup(c2.id).is_some());

        index.remove(c1.id);
        assert_eq!(index.size(), 1);
        assert!(index.lookup(c1.id).is_none());
        let hits = index.search(&[0.0, 1.0], 5, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, c2.id);
    }

    #[test]
    fn k_larger_than_indexed_count_returns_all() {
        let index = KdTreeIndex::new(Metric::Cosine);
        index
            .build(vec![make_chunk(vec![1.0, 0.0]), make_chunk(vec![0.0, 1.0])])
            .unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 50, None).unwrap().len(), 2);
    }
}
