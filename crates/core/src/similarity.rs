//! Similarity kernel (C1): distance/similarity between equal-length vectors.
//!
//! Three metrics are supported: `cosine`, `euclidean`, `dot_product`. All
//! three return a `(distance, similarity)` pair such that lower distance is
//! always a better match, even though `dot_product`'s "distance" is only a
//! sort key and not a true metric (see `DESIGN.md`).

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cosine,
    Euclidean,
    DotProduct,
}

impl Metric {
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            "dot_product" => Ok(Metric::DotProduct),
            other => Err(Error::InvalidMetric(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::DotProduct => "dot_product",
        }
    }
}

/// Compute `(distance, similarity)` between `u` and `v` under `metric`.
///
/// Callers are responsible for equal-length vectors; indexes enforce that
/// invariant before calling in (see `index::linear` and `index::kdtree`).
pub fn compute(u: &[f32], v: &[f32], metric: Metric) -> (f64, f64) {
    match metric {
        Metric::Cosine => cosine(u, v),
        Metric::Euclidean => euclidean(u, v),
        Metric::DotProduct => dot_product(u, v),
    }
}

fn cosine(u: &[f32], v: &[f32]) -> (f64, f64) {
    let norm_u: f64 = u.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_v: f64 = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if norm_u == 0.0 || norm_v == 0.0 {
        return (1.0, 0.0);
    }

    let dot: f64 = u
        .iter()
        .zip(v.iter())
        .map(|(a, b)| (*a as f64) * (*b as f64))
        .sum();
    let similarity = dot / (norm_u * norm_v);
    (1.0 - similarity, similarity)
}

fn euclidean(u: &[f32], v: &[f32]) -> (f64, f64) {
    let distance: f64 = u
        .iter()
        .zip(v.iter())
        .map(|(a, b)| {
            let d = (*a as f64) - (*b as f64);
            d * d
        })
        .sum::<f64>()
        .sqrt();
    let similarity = 1.0 / (1.0 + distance);
    (distance, similarity)
}

fn dot_product(u: &[f32], v: &[f32]) -> (f64, f64) {
    let similarity: f64 = u
        .iter()
        .zip(v.iter())
        .map(|(a, b)| (*a as f64) * (*b as f64))
        .sum();
    (-similarity, similarity)
}
