use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sharedfiles_core::AppError;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub detail: String,
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File id including extension"),
        ("auth" = String, Header, description = "Shared secret")
    ),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 401, description = "Missing or wrong auth header", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    if !state.backend.delete(&file_id).await? {
        return Err(AppError::NotFound("File not found".to_string()).into());
    }

    Ok(Json(DeleteResponse {
        detail: "File deleted".to_string(),
    }))
}
