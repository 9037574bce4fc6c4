//! Index (C2): pluggable k-NN indexes sharing one contract.
//!
//! | Operation | Input | Output | Notes |
//! |---|---|---|---|
//! | [`Index::build`] | chunks | — | replaces prior contents |
//! | [`Index::search`] | query vector, k, metric override | ranked hits | ascending by distance |
//! | [`Index::add`] | one chunk | — | idempotent on identical id |
//! | [`Index::remove`] | chunk id | — | no-op if absent |
//! | [`Index::lookup`] | chunk id | chunk or absent | |
//! | [`Index::size`] | — | indexed count | |
//! | [`Index::built`] | — | boolean | |

pub mod kdtree;
pub mod linear;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::similarity::Metric;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub distance: f64,
    pub similarity: f64,
}

/// Shared contract for every index variant (Linear, KD-tree).
///
/// Implementations guard their state with a single mutual-exclusion lock
/// that every method (including reads) acquires, so a reader never observes
/// a partial build. None of these methods re-enter their own lock, so a
/// plain `std::sync::Mutex` gives the same guarantee a reentrant guard
/// would (see `DESIGN.md`).
pub trait Index: Send + Sync {
    /// Replace all indexed contents with `chunks`. Dimension is recorded
    /// from the first chunk; later chunks of a different length are
    /// rejected with [`Error::DimensionMismatch`].
    fn build(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Return up to `k` nearest hits to `query`, ascending by distance.
    /// `metric` overrides the index's default metric for this call only.
    fn search(&self, query: &[f32], k: usize, metric: Option<Metric>) -> Result<Vec<SearchHit>>;

    /// Insert or replace a single chunk. No-op (success) if an identical id
    /// is already present with the same content.
    fn add(&self, chunk: Chunk) -> Result<()>;

    /// Remove a chunk by id. No-op if absent.
    fn remove(&self, chunk_id: Uuid);

    /// Look up a single chunk by id.
    fn lookup(&self, chunk_id: Uuid) -> Option<Chunk>;

    /// Number of indexed chunks.
    fn size(&self) -> usize;

    /// Whether `build` has been called at least once.
    fn built(&self) -> bool;

    /// The metric used when a search call doesn't override it.
    fn default_metric(&self) -> Metric;
}

/// Validate that a non-empty query vector's length matches `dimension`.
pub(crate) fn validate_query(query: &[f32], dimension: Option<usize>) -> Result<()> {
    if query.is_empty() {
        return Err(Error::EmptyQuery);
    }
    if let Some(dim) = dimension {
        if query.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }
    }
    Ok(())
}
