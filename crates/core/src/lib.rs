//! In-process vector database core: a library → document → chunk catalog,
//! pluggable k-NN indexes, a metadata predicate language, and a query
//! engine that ties the two together.
//!
//! This crate has no networking, no file I/O, and no async runtime — a host
//! application owns the process boundary (HTTP, CLI, embedding calls) and
//! embeds [`catalog::Catalog`] and [`query_engine::QueryEngine`] directly.

pub mod catalog;
pub mod error;
pub mod index;
pub mod models;
pub mod predicate;
pub mod query_engine;
pub mod similarity;

pub use catalog::{Catalog, CatalogStats, LibraryTree};
pub use error::{Error, Result};
pub use models::{Chunk, Document, Library, Metadata};
pub use query_engine::QueryEngine;
pub use similarity::Metric;
