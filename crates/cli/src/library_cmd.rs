//! `library` subcommand: CRUD over `catalogdb_core::Catalog` libraries.

use anyhow::{Context, Result};
use catalogdb_core::{Catalog, Error as CoreError, Metadata};
use clap::Subcommand;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum LibraryAction {
    /// Create a new library
    Create {
        name: String,
        /// JSON object of metadata, e.g. '{"owner":"research"}'
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Print a library by id
    Get { id: Uuid },
    /// List every library
    List,
    /// Update a library's name and/or metadata
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete a library and cascade to its documents/chunks
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

pub fn run(catalog: &Catalog, action: LibraryAction) -> Result<()> {
    match action {
        LibraryAction::Create { name, metadata } => {
            let metadata = parse_metadata(metadata)?;
            let library = catalog.create_library(Uuid::new_v4(), name, metadata)?;
            println!("created library {}", library.id);
            println!("{}", serde_json::to_string_pretty(&library)?);
        }
        LibraryAction::Get { id } => {
            let library = catalog
                .get_library(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&library)?);
        }
        LibraryAction::List => {
            let libraries = catalog.list_libraries();
            println!("{}", serde_json::to_string_pretty(&libraries)?);
        }
        LibraryAction::Update { id, name, metadata } => {
            let metadata = match metadata {
                Some(raw) => Some(parse_metadata(Some(raw))?),
                None => None,
            };
            let library = catalog.update_library(id, name, metadata)?;
            println!("updated library {}", library.id);
            println!("{}", serde_json::to_string_pretty(&library)?);
        }
        LibraryAction::Delete { id } => {
            if catalog.delete_library(id) {
                println!("deleted library {id}");
            } else {
                println!("library {id} did not exist");
            }
        }
    }
    Ok(())
}
