//! Query engine (C4): per-library index management plus filtered search.
//!
//! Each library owns at most one live index instance at a time, keyed by a
//! variant name drawn from a closed registry (`"brute_force"` → Linear,
//! `"kdtree"` → KDTree). An index is created lazily — on the first call that
//! touches a library that has never had [`QueryEngine::set_variant`] called
//! for it — using the engine's configured default variant/metric.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::index::kdtree::KdTreeIndex;
use crate::index::linear::LinearIndex;
use crate::index::{Index, SearchHit};
use crate::models::Chunk;
use crate::predicate;
use crate::similarity::Metric;

pub const VARIANT_BRUTE_FORCE: &str = "brute_force";
pub const VARIANT_KDTREE: &str = "kdtree";

/// Multiplier applied to `k` when a filter is present, before the
/// iterative-doubling fallback kicks in.
const OVER_FETCH_FACTOR: usize = 3;

struct LibraryEntry {
    variant: String,
    index: Box<dyn Index>,
}

fn create_index(variant: &str, metric: Metric) -> Result<Box<dyn Index>> {
    match variant {
        VARIANT_BRUTE_FORCE => Ok(Box::new(LinearIndex::new(metric))),
        VARIANT_KDTREE => Ok(Box::new(KdTreeIndex::new(metric))),
        other => Err(Error::UnknownVariant(other.to_string())),
    }
}

pub struct QueryEngine {
    entries: Mutex<HashMap<Uuid, LibraryEntry>>,
    default_variant: String,
    default_metric: Metric,
}

impl QueryEngine {
    pub fn new(default_variant: &str, default_metric: Metric) -> Result<Self> {
        // Validate eagerly so a bad default is caught at construction, not
        // on the first library that happens to touch it.
        create_index(default_variant, default_metric)?;
        Ok(Self {
            entries: Mutex::new(HashMap::new()),
            default_variant: default_variant.to_string(),
            default_metric,
        })
    }

    /// Set (or replace) the index variant for a library. Replacing drops
    /// whatever was previously indexed — the caller is expected to follow
    /// up with [`QueryEngine::index_library`].
    pub fn set_variant(&self, library_id: Uuid, variant: &str) -> Result<()> {
        let index = create_index(variant, self.default_metric)?;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            library_id,
            LibraryEntry {
                variant: variant.to_string(),
                index,
            },
        );
        Ok(())
    }

    /// Return the library's declared variant, or the engine's default if
    /// none has been declared.
    pub fn get_variant(&self, library_id: Uuid) -> String {
        self.entries
            .lock()
            .unwrap()
            .get(&library_id)
            .map(|e| e.variant.clone())
            .unwrap_or_else(|| self.default_variant.clone())
    }

    fn ensure_entry(&self, library_id: Uuid) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if !entries.contains_key(&library_id) {
            let index = create_index(&self.default_variant, self.default_metric)?;
            entries.insert(
                library_id,
                LibraryEntry {
                    variant: self.default_variant.clone(),
                    index,
                },
            );
        }
        Ok(())
    }

    /// (Re)build a library's index from scratch with `chunks`.
    pub fn index_library(&self, library_id: Uuid, chunks: Vec<Chunk>) -> Result<()> {
        self.ensure_entry(library_id)?;
        let entries = self.entries.lock().unwrap();
        entries
            .get(&library_id)
            .expect("ensure_entry just inserted this key")
            .index
            .build(chunks)
    }

    pub fn add_chunk_to_index(&self, library_id: Uuid, chunk: Chunk) -> Result<()> {
        self.ensure_entry(library_id)?;
        let entries = self.entries.lock().unwrap();
        entries
            .get(&library_id)
            .expect("ensure_entry just inserted this key")
            .index
            .add(chunk)
    }

    /// No-op if the library has no live index or the chunk isn't indexed.
    pub fn remove_chunk_from_index(&self, library_id: Uuid, chunk_id: Uuid) {
        let entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(&library_id) {
            entry.index.remove(chunk_id);
        }
    }

    pub fn index_size(&self, library_id: Uuid) -> usize {
        self.entries
            .lock()
            .unwrap()
            .get(&library_id)
            .map(|e| e.index.size())
            .unwrap_or(0)
    }

    /// Return up to `k` nearest chunks matching `filter`, over-fetching and
    /// doubling the fetch size as needed so a narrow filter doesn't starve
    /// the result set short of `k` while unexplored candidates remain.
    ///
    /// A library with no active index (never built, never touched) returns
    /// an empty result without installing one — search is a read and must
    /// not have the side effect of creating index state.
    pub fn search(
        &self,
        library_id: Uuid,
        query: &[f32],
        k: usize,
        metric: Option<Metric>,
        filter: Option<&Value>,
    ) -> Result<Vec<SearchHit>> {
        let entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get(&library_id) else {
            return Ok(Vec::new());
        };

        if k == 0 {
            return Ok(Vec::new());
        }

        let total = entry.index.size();
        let mut fetch = if filter.is_some() {
            k.saturating_mul(OVER_FETCH_FACTOR)
        } else {
            k
        };

        loop {
            let raw = entry.index.search(query, fetch, metric)?;
            let mut matched: Vec<SearchHit> = match filter {
                Some(pred) => raw
                    .into_iter()
                    .filter(|hit| predicate::evaluate(&hit.chunk.metadata, pred))
                    .collect(),
                None => raw,
            };

            if matched.len() >= k || fetch >= total {
                matched.truncate(k);
                return Ok(matched);
            }

            fetch = (fetch * 2).min(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap as StdHashMap;

    fn make_chunk(embedding: Vec<f32>, metadata: StdHashMap<String, Value>) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            text: "hello".to_string(),
            embedding,
            metadata,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn engine() -> QueryEngine {
        QueryEngine::new(VARIANT_BRUTE_FORCE, Metric::Cosine).unwrap()
    }

    #[test]
    fn unknown_variant_at_construction_errors() {
        let err = QueryEngine::new("not_a_real_variant", Metric::Cosine).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant(_)));
    }

    #[test]
    fn set_variant_rejects_unknown_name() {
        let engine = engine();
        let err = engine.set_variant(Uuid::new_v4(), "hnsw").unwrap_err();
        assert!(matches!(err, Error::UnknownVariant(_)));
    }

    #[test]
    fn undeclared_library_reports_the_system_default() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        assert_eq!(engine.get_variant(library_id), VARIANT_BRUTE_FORCE);
        engine.index_library(library_id, vec![]).unwrap();
        assert_eq!(engine.get_variant(library_id), VARIANT_BRUTE_FORCE);
    }

    #[test]
    fn explicit_variant_is_respected() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        engine.set_variant(library_id, VARIANT_KDTREE).unwrap();
        assert_eq!(engine.get_variant(library_id), VARIANT_KDTREE);
    }

    #[test]
    fn search_on_untouched_library_returns_empty_without_installing_an_index() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        let hits = engine.search(library_id, &[1.0, 0.0], 5, None, None).unwrap();
        assert!(hits.is_empty());
        assert_eq!(engine.index_size(library_id), 0);
        // get_variant still reports the default — it wasn't installed as a
        // live entry by the read-only search call.
        assert_eq!(engine.get_variant(library_id), VARIANT_BRUTE_FORCE);
    }

    #[test]
    fn search_without_filter_returns_k_nearest() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        let chunks = vec![
            make_chunk(vec![1.0, 0.0], StdHashMap::new()),
            make_chunk(vec![0.0, 1.0], StdHashMap::new()),
            make_chunk(vec![0.9, 0.1], StdHashMap::new()),
        ];
        engine.index_library(library_id, chunks).unwrap();
        let hits = engine
            .search(library_id, &[1.0, 0.0], 2, None, None)
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn over_fetch_doubles_until_k_filtered_hits_found() {
        let engine = engine();
        let library_id = Uuid::new_v4();

        let mut chunks = Vec::new();
        for i in 0..20 {
            let mut meta = StdHashMap::new();
            // Only the last chunk carries the matching category; a naive
            // fetch of 3*k=3 would miss it entirely.
            if i == 19 {
                meta.insert("category".to_string(), json!("healthcare"));
            } else {
                meta.insert("category".to_string(), json!("finance"));
            }
            chunks.push(make_chunk(vec![1.0 - (i as f32) * 0.01, i as f32 * 0.01], meta));
        }
        engine.index_library(library_id, chunks).unwrap();

        let filter = json!({"category": "healthcare"});
        let hits = engine
            .search(library_id, &[1.0, 0.0], 1, None, Some(&filter))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.metadata.get("category").unwrap(), "healthcare");
    }

    #[test]
    fn filter_matching_fewer_than_k_returns_all_matches() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        let mut meta = StdHashMap::new();
        meta.insert("category".to_string(), json!("healthcare"));
        let chunks = vec![
            make_chunk(vec![1.0, 0.0], meta.clone()),
            make_chunk(vec![0.0, 1.0], StdHashMap::new()),
        ];
        engine.index_library(library_id, chunks).unwrap();

        let filter = json!({"category": "healthcare"});
        let hits = engine
            .search(library_id, &[1.0, 0.0], 5, None, Some(&filter))
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn remove_chunk_from_index_excludes_it_from_search() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        let c1 = make_chunk(vec![1.0, 0.0], StdHashMap::new());
        let c2 = make_chunk(vec![0.0, 1.0], StdHashMap::new());
        engine.index_library(library_id, vec![c1.clone(), c2.clone()]).unwrap();

        engine.remove_chunk_from_index(library_id, c1.id);
        let hits = engine.search(library_id, &[1.0, 0.0], 5, None, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, c2.id);
    }

    #[test]
    fn add_chunk_to_index_is_reflected_immediately() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        engine.index_library(library_id, vec![]).unwrap();
        let chunk = make_chunk(vec![1.0, 0.0], StdHashMap::new());
        engine.add_chunk_to_index(library_id, chunk.clone()).unwrap();
        assert_eq!(engine.index_size(library_id), 1);
        let hits = engine.search(library_id, &[1.0, 0.0], 1, None, None).unwrap();
        assert_eq!(hits[0].chunk.id, chunk.id);
    }

    #[test]
    fn empty_k_returns_empty_without_touching_the_index() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        let hits = engine.search(library_id, &[1.0, 0.0], 0, None, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn kdtree_variant_is_used_end_to_end() {
        let engine = engine();
        let library_id = Uuid::new_v4();
        engine.set_variant(library_id, VARIANT_KDTREE).unwrap();
        let chunks = vec![
            make_chunk(vec![1.0, 0.0, 0.0], StdHashMap::new()),
            make_chunk(vec![0.0, 1.0, 0.0], StdHashMap::new()),
            make_chunk(vec![0.0, 0.0, 1.0], StdHashMap::new()),
        ];
        engine.index_library(library_id, chunks).unwrap();
        let hits = engine
            .search(library_id, &[0.9, 0.1, 0.0], 1, None, None)
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
