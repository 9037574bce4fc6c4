//! Discriminated error taxonomy for the catalog, index, and query engine.
//!
//! Every fallible operation in this crate returns one of these variants so
//! that a host adapter (HTTP, CLI, …) can map errors to its own surface
//! without string matching.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("parent missing: {0}")]
    ParentMissing(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown index variant: {0}")]
    UnknownVariant(String),

    #[error("query vector is empty")]
    EmptyQuery,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid similarity metric: {0}")]
    InvalidMetric(String),
}

pub type Result<T> = std::result::Result<T, Error>;
