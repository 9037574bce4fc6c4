//! # catalogdb
//!
//! Command-line demonstrator for `catalogdb-core`: a library → document →
//! chunk catalog, pluggable k-NN indexes, and a metadata-filtered query
//! engine — all in-process, with no persistence between invocations.
//!
//! ## Modules
//!
//! - [`config`] — optional TOML configuration with built-in defaults
//! - [`library_cmd`] / [`document_cmd`] / [`chunk_cmd`] — catalog CRUD
//! - [`index_cmd`] — per-library index variant management
//! - [`search_cmd`] — filtered k-NN search
//! - [`demo`] — a canned single-process walk through the full lifecycle

mod chunk_cmd;
mod config;
mod demo;
mod document_cmd;
mod index_cmd;
mod library_cmd;
mod search_cmd;

use std::path::PathBuf;
use std::process::ExitCode;

use catalogdb_core::{Catalog, Error as CoreError, Metric, QueryEngine};
use chunk_cmd::ChunkAction;
use clap::{Parser, Subcommand};
use document_cmd::DocumentAction;
use index_cmd::IndexAction;
use library_cmd::LibraryAction;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "catalogdb", about = "In-process vector database demonstrator", version)]
struct Cli {
    /// Path to an optional TOML config file
    #[arg(long, global = true, default_value = "catalogdb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage libraries
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
    /// Manage documents
    Document {
        #[command(subcommand)]
        action: DocumentAction,
    },
    /// Manage chunks
    Chunk {
        #[command(subcommand)]
        action: ChunkAction,
    },
    /// Manage a library's index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Search a library's index
    Search {
        library_id: Uuid,
        /// Comma-separated query vector, e.g. "0.1,0.2,0.3"
        query: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[arg(long)]
        metric: Option<String>,
        /// JSON metadata predicate, e.g. '{"category":"healthcare"}'
        #[arg(long)]
        filter: Option<String>,
    },
    /// Run a built-in end-to-end lifecycle demonstration
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err:?}");
            return ExitCode::from(1);
        }
    };

    match run(cli.command, &cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(command: Commands, cfg: &config::Config) -> anyhow::Result<()> {
    match command {
        Commands::Library { action } => {
            let catalog = Catalog::new();
            library_cmd::run(&catalog, action)
        }
        Commands::Document { action } => {
            let catalog = Catalog::new();
            document_cmd::run(&catalog, action)
        }
        Commands::Chunk { action } => {
            let catalog = Catalog::new();
            chunk_cmd::run(&catalog, action)
        }
        Commands::Index { action } => {
            let catalog = Catalog::new();
            let engine = QueryEngine::new(&cfg.default_index_variant, Metric::parse(&cfg.default_metric)?)?;
            index_cmd::run(&catalog, &engine, action)
        }
        Commands::Search {
            library_id,
            query,
            k,
            metric,
            filter,
        } => {
            let engine = QueryEngine::new(&cfg.default_index_variant, Metric::parse(&cfg.default_metric)?)?;
            search_cmd::run(&engine, library_id, query, k, metric, filter)
        }
        Commands::Demo => demo::run(cfg),
    }
}

/// Map a `core::error::Error` to a process exit code (`SPEC_FULL.md` §6).
/// Any other error (config, argument parsing, JSON) exits 1.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::NotFound(_)) | Some(CoreError::ParentMissing(_)) => 2,
        Some(CoreError::Validation(_))
        | Some(CoreError::UnknownVariant(_))
        | Some(CoreError::EmptyQuery)
        | Some(CoreError::DimensionMismatch { .. })
        | Some(CoreError::InvalidMetric(_)) => 3,
        Some(CoreError::AlreadyExists(_)) => 3,
        None => 1,
    }
}
