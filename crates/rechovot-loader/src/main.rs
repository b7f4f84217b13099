//! Rechovot loader
//!
//! Loads the street catalog from a spreadsheet into the search index.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rechovot_fts::{BackendConfig, FieldSchema, create_search_backend};
use rechovot_loader::{BulkLoader, DEFAULT_BATCH_SIZE, LoadConfig, open_source};

/// Rechovot loader - spreadsheet to search index
#[derive(Parser, Debug)]
#[command(name = "rechovot-load")]
#[command(about = "Load the street catalog into the search index", long_about = None)]
struct Args {
    /// Directory holding the search indexes
    #[arg(long, env = "RECHOVOT_INDEX_ROOT", default_value = "data/index")]
    index_root: PathBuf,

    /// Target index name
    #[arg(long, env = "RECHOVOT_INDEX", default_value = "streets")]
    index: String,

    /// Source spreadsheet (.xlsx, .xls, .ods) or .csv file
    #[arg(long, env = "RECHOVOT_SOURCE", default_value = "data/streets.xlsx")]
    source: PathBuf,

    /// Mapping document
    #[arg(long, env = "RECHOVOT_SCHEMA", default_value = "config/streets-mapping.json")]
    schema: PathBuf,

    /// Documents per bulk write
    #[arg(long, env = "RECHOVOT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rechovot=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "Starting load");

    let config = LoadConfig::new(&args.source, &args.index).with_batch_size(args.batch_size);
    config.validate()?;

    // Configuration and source problems surface before the backend is touched
    let (mapping, schema) = FieldSchema::load(&args.schema)?;
    tracing::info!(fields = schema.len(), schema = %args.schema.display(), "Loaded field schema");
    let source = open_source(&args.source)?;

    let backend = create_search_backend(&BackendConfig::tantivy(&args.index_root))?;
    let loader = BulkLoader::new(backend, mapping, schema, config);

    let report = loader
        .run(source.as_ref())
        .await
        .with_context(|| format!("Loading {} failed", args.source.display()))?;

    println!("{}", report.summary());
    Ok(())
}
