//! `demo` subcommand: a single-process walk through the whole lifecycle
//! (library → document → chunks → index → filtered search), since
//! `crates/core` keeps no state between process invocations.

use anyhow::Result;
use catalogdb_core::{Catalog, Metadata, Metric, QueryEngine};
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let catalog = Catalog::new();
    let engine = QueryEngine::new(&config.default_index_variant, Metric::parse(&config.default_metric)?)?;

    let library = catalog.create_library(Uuid::new_v4(), "Demo Library".to_string(), Metadata::new())?;
    println!("created library {} ({})", library.name, library.id);

    let mut metadata = Metadata::new();
    metadata.insert("category".to_string(), json!("healthcare"));
    let document = catalog.create_document(
        Uuid::new_v4(),
        library.id,
        "Demo Document".to_string(),
        metadata,
    )?;
    println!("created document {} ({})", document.title, document.id);

    let samples: &[(&str, [f32; 4], &str)] = &[
        ("Overview of clinical trial design", [0.9, 0.1, 0.05, 0.02], "healthcare"),
        ("Quarterly revenue summary", [0.05, 0.9, 0.1, 0.02], "finance"),
        ("Patient intake best practices", [0.85, 0.15, 0.1, 0.05], "healthcare"),
    ];

    for (text, embedding, category) in samples {
        let mut metadata = Metadata::new();
        metadata.insert("category".to_string(), json!(category));
        let chunk = catalog.create_chunk(
            Uuid::new_v4(),
            document.id,
            text.to_string(),
            embedding.to_vec(),
            metadata,
        )?;
        println!("created chunk {} ({text})", chunk.id);
    }

    engine.set_variant(library.id, &config.default_index_variant)?;
    let chunks = catalog.list_chunks_for_library(library.id);
    engine.index_library(library.id, chunks)?;
    println!("indexed library {}", library.id);

    let filter = json!({"category": "healthcare"});
    let hits = engine.search(library.id, &[0.9, 0.1, 0.05, 0.02], 5, None, Some(&filter))?;

    println!("\nsearch results (category = healthcare):");
    for hit in hits {
        println!(
            "  [{:.4}] {} — {}",
            hit.similarity, hit.chunk.id, hit.chunk.text
        );
    }

    Ok(())
}
