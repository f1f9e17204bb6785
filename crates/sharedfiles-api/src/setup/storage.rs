//! Storage setup and initialization

use anyhow::{Context, Result};
use sharedfiles_core::Config;
use sharedfiles_storage::{create_backend, Backend};
use std::sync::Arc;

/// Build the storage backend selected by the configuration.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Backend>> {
    tracing::info!("Initializing storage backend...");

    let backend = create_backend(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(backend = %backend.kind(), "Storage backend initialized successfully");
    Ok(backend)
}
