//! `index` subcommand: query-engine index management for a library.

use anyhow::Result;
use catalogdb_core::{Catalog, Error as CoreError, QueryEngine};
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum IndexAction {
    /// Select the index variant a library will use (brute_force, kdtree)
    SetVariant { library_id: Uuid, variant: String },
    /// Print the index variant currently assigned to a library
    GetVariant { library_id: Uuid },
    /// Build (or rebuild) a library's index from its current chunks
    Build { library_id: Uuid },
}

pub fn run(catalog: &Catalog, engine: &QueryEngine, action: IndexAction) -> Result<()> {
    match action {
        IndexAction::SetVariant { library_id, variant } => {
            engine.set_variant(library_id, &variant)?;
            println!("library {library_id} now uses index variant '{variant}'");
        }
        IndexAction::GetVariant { library_id } => {
            println!("{}", engine.get_variant(library_id));
        }
        IndexAction::Build { library_id } => {
            catalog
                .get_library(library_id)
                .ok_or_else(|| CoreError::NotFound(library_id.to_string()))?;
            let chunks = catalog.list_chunks_for_library(library_id);
            let count = chunks.len();
            engine.index_library(library_id, chunks)?;
            println!("indexed {count} chunk(s) for library {library_id}");
        }
    }
    Ok(())
}
