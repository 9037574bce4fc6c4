//! `chunk` subcommand: CRUD over `catalogdb_core::Catalog` chunks.

use anyhow::{Context, Result};
use catalogdb_core::{Catalog, Error as CoreError, Metadata};
use clap::Subcommand;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ChunkAction {
    /// Create a new chunk under a document
    Create {
        document_id: Uuid,
        text: String,
        /// Comma-separated embedding vector, e.g. "0.1,0.2,0.3"
        #[arg(long, default_value = "")]
        embedding: String,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Print a chunk by id
    Get { id: Uuid },
    /// List every chunk in a document
    List { document_id: Uuid },
    /// Update a chunk's text, embedding, and/or metadata
    Update {
        id: Uuid,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        embedding: Option<String>,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete a chunk
    Delete { id: Uuid },
}

fn parse_metadata(raw: Option<String>) -> Result<Metadata> {
    match raw {
        None => Ok(Metadata::new()),
        Some(raw) => {
            let value: JsonValue = serde_json::from_str(&raw).context("metadata must be valid JSON")?;
            let object = value
                .as_object()
                .context("metadata must be a JSON object")?
                .clone();
            Ok(object.into_iter().collect())
        }
    }
}

pub fn parse_embedding(raw: &str) -> Result<Vec<f32>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|part| part.trim().parse::<f32>().context("embedding must be comma-separated floats"))
        .collect()
}

pub fn run(catalog: &Catalog, action: ChunkAction) -> Result<()> {
    match action {
        ChunkAction::Create {
            document_id,
            text,
            embedding,
            metadata,
        } => {
            let metadata = parse_metadata(metadata)?;
            let embedding = parse_embedding(&embedding)?;
            let chunk = catalog.create_chunk(Uuid::new_v4(), document_id, text, embedding, metadata)?;
            println!("created chunk {}", chunk.id);
            println!("{}", serde_json::to_string_pretty(&chunk)?);
        }
        ChunkAction::Get { id } => {
            let chunk = catalog
                .get_chunk(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&chunk)?);
        }
        ChunkAction::List { document_id } => {
            let chunks = catalog.list_chunks_for_document(document_id);
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        ChunkAction::Update {
            id,
            text,
            embedding,
            metadata,
        } => {
            let metadata = match metadata {
                Some(raw) => Some(parse_metadata(Some(raw))?),
                None => None,
            };
            let embedding = match embedding {
                Some(raw) => Some(parse_embedding(&raw)?),
                None => None,
            };
            let chunk = catalog.update_chunk(id, text, embedding, metadata)?;
            println!("updated chunk {}", chunk.id);
            println!("{}", serde_json::to_string_pretty(&chunk)?);
        }
        ChunkAction::Delete { id } => {
            if catalog.delete_chunk(id) {
                println!("deleted chunk {id}");
            } else {
                println!("chunk {id} did not exist");
            }
        }
    }
    Ok(())
}
