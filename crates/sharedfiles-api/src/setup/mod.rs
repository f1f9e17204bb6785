//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use sharedfiles_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    sharedfiles_infra::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        port = config.server_port(),
        "Configuration loaded and validated successfully"
    );

    let backend = storage::setup_storage(&config).await?;
    let state = Arc::new(AppState::new(config.clone(), backend));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
