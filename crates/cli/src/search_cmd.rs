//! `search` subcommand: query-engine search with an optional metadata filter.

use anyhow::{Context, Result};
use catalogdb_core::{Metric, QueryEngine};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::chunk_cmd::parse_embedding;

pub fn run(
    engine: &QueryEngine,
    library_id: Uuid,
    query: String,
    k: usize,
    metric: Option<String>,
    filter: Option<String>,
) -> Result<()> {
    let query_vector = parse_embedding(&query)?;
    let metric = metric.map(|m| Metric::parse(&m)).transpose()?;
    let filter: Option<JsonValue> = filter
        .map(|raw| serde_json::from_str(&raw).context("filter must be valid JSON"))
        .transpose()?;

    let hits = engine.search(library_id, &query_vector, k, metric, filter.as_ref())?;

    #[derive(serde::Serialize)]
    struct Hit {
        chunk_id: Uuid,
        distance: f64,
        similarity: f64,
        text: String,
    }

    let rendered: Vec<Hit> = hits
        .into_iter()
        .map(|h| Hit {
            chunk_id: h.chunk.id,
            distance: h.distance,
            similarity: h.similarity,
            text: h.chunk.text,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
