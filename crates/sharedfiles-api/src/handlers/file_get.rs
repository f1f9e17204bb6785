use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sharedfiles_core::{AppError, FileRecord};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// `Content-Disposition` value for inline display.
///
/// Characters that cannot appear in a quoted header value are replaced with `_`.
pub fn inline_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("inline; filename=\"{}\"", safe)
}

/// List every stored file
#[utoipa::path(
    get,
    path = "/files/",
    tag = "files",
    responses(
        (status = 200, description = "Metadata of every stored file", body = Vec<FileRecord>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileRecord>>, HttpAppError> {
    let files = state.backend.list().await?;
    tracing::debug!(count = files.len(), "Listed files");
    Ok(Json(files))
}

/// Download a file
///
/// Served inline with the MIME type recorded at upload.
#[utoipa::path(
    get,
    path = "/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File id including extension")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response, HttpAppError> {
    let file = state.backend.get(&file_id).await?;

    let content_type = HeaderValue::from_str(&file.record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&inline_disposition(&file.record.filename))
        .map_err(|e| AppError::Internal(format!("Invalid Content-Disposition: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(file.content),
    )
        .into_response())
}
