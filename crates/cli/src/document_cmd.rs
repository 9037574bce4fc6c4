//! `document` subcommand: CRUD over `catalogdb_core::Catalog` documents.

use anyhow::{Context, Result};
use catalogdb_core::{Catalog, Error as CoreError, Metadata};
use clap::Subcommand;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum DocumentAction {
    /// Create a new document under a library
    Create {
        library_id: Uuid,
        title: String,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Print a document by id
    Get { id: Uuid },
    /// List every document in a library
    List { library_id: Uuid },
    /// Update a document's title and/or metadata
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete a document and cascade to its chunks
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

pub fn run(catalog: &Catalog, action: DocumentAction) -> Result<()> {
    match action {
        DocumentAction::Create {
            library_id,
            title,
            metadata,
        } => {
            let metadata = parse_metadata(metadata)?;
            let document = catalog.create_document(Uuid::new_v4(), library_id, title, metadata)?;
            println!("created document {}", document.id);
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        DocumentAction::Get { id } => {
            let document = catalog
                .get_document(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        DocumentAction::List { library_id } => {
            let documents = catalog.list_documents_for_library(library_id);
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        DocumentAction::Update { id, title, metadata } => {
            let metadata = match metadata {
                Some(raw) => Some(parse_metadata(Some(raw))?),
                None => None,
            };
            let document = catalog.update_document(id, title, metadata)?;
            println!("updated document {}", document.id);
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        DocumentAction::Delete { id } => {
            if catalog.delete_document(id) {
                println!("deleted document {id}");
            } else {
                println!("document {id} did not exist");
            }
        }
    }
    Ok(())
}
