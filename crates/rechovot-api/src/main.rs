//! Rechovot API server entry point.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use rechovot_api::{Settings, StreetService, app, serve};
use rechovot_fts::create_search_backend;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rechovot=debug,tower_http=debug".into()),
        )
        .init();

    let settings = Settings::parse();

    let backend = create_search_backend(&settings.backend())?;
    if !backend.index_exists(&settings.index).await? {
        tracing::warn!(
            index = %settings.index,
            "Index does not exist yet; searches will fail until the loader has run"
        );
    }

    let service = StreetService::new(backend, settings.index.clone());
    let listener = TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    tracing::info!(bind = %settings.bind, index = %settings.index, "Listening");

    serve(listener, app(service)).await?;
    Ok(())
}
