use std::sync::Arc;

use axum::{extract::State, Json};
use sharedfiles_core::models::PoolStatus;
use sharedfiles_core::AppError;
use sharedfiles_storage::StorageStatus;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Storage pool status
///
/// One entry per configured pool, in priority order. Unreachable pools are
/// reported with status `ERROR`.
#[utoipa::path(
    get,
    path = "/files/clusters",
    tag = "files",
    params(
        ("auth" = String, Header, description = "Shared secret")
    ),
    responses(
        (status = 200, description = "Per-pool status", body = Vec<PoolStatus>),
        (status = 401, description = "Missing or wrong auth header", body = ErrorResponse),
        (status = 404, description = "Status unavailable for local storage", body = ErrorResponse)
    )
)]
pub async fn cluster_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PoolStatus>>, HttpAppError> {
    match state.backend.status().await? {
        StorageStatus::Pools(pools) => Ok(Json(pools)),
        StorageStatus::Unsupported => Err(AppError::NotFound(
            "Status is unavailable for local storage".to_string(),
        )
        .into()),
    }
}
