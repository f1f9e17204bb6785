use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use serde::Serialize;
use sharedfiles_core::BackendKind;
use utoipa::ToSchema;

use crate::state::AppState;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    /// Active backend: `pool` or `local`
    pub backend: String,
    /// `healthy`, `timeout` or `unhealthy: <reason>`
    pub storage: String,
}

/// Health check
///
/// Always answers 200; `status` is `degraded` when storage cannot report its
/// remaining capacity.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backend: BackendKind = state.backend.kind();

    let storage =
        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, state.backend.remaining_capacity())
            .await
        {
            Ok(Ok(_)) => "healthy".to_string(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Storage health check failed");
                format!("unhealthy: {}", e)
            }
            Err(_) => {
                tracing::warn!("Storage health check timed out");
                "timeout".to_string()
            }
        };

    let status = if storage == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        backend: backend.to_string(),
        storage,
    })
}
