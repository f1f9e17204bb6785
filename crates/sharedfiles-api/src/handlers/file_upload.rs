use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap},
    Json,
};
use bytes::Bytes;
use sharedfiles_core::{AppError, Config, UploadReceipt};
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Parsed `multipart/form-data` upload.
struct UploadForm {
    data: Bytes,
    /// Name sent with the file part
    original_filename: Option<String>,
    /// Explicit `filename` form field; overrides the part's name
    filename: Option<String>,
    mime_type: Option<String>,
}

/// Read the `file` part and the optional `filename` field.
/// Only one field named "file" is accepted.
async fn extract_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut data: Option<Bytes> = None;
    let mut original_filename = None;
    let mut filename = None;
    let mut mime_type = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if data.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                original_filename = field.file_name().map(str::to_string);
                mime_type = field.content_type().map(str::to_string);
                data = Some(field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "filename" => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read filename: {}", e))
                })?;
                filename = Some(value).filter(|v| !v.trim().is_empty());
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(UploadForm {
        data,
        original_filename,
        filename,
        mime_type,
    })
}

/// Generate a new file id: a random UUID plus the original extension.
///
/// Extensions that are not plain alphanumerics are dropped.
pub fn new_file_id(original_filename: Option<&str>) -> String {
    let extension = original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// Base URL used to build file locators.
///
/// `PUBLIC_BASE_URL` wins; otherwise the request's `Host` header (and
/// `X-Forwarded-Proto` when a proxy sets it).
pub fn request_base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");

    format!("{}://{}", scheme, host)
}

fn validate_file_size(size: u64, max_size: u64) -> Result<(), AppError> {
    if size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size of {} bytes exceeds the limit of {} bytes",
            size, max_size
        )));
    }
    Ok(())
}

/// Upload a file
///
/// Stores the `file` part under a new id and returns the id and its URL. The
/// optional `filename` form field replaces the uploaded file's name in metadata.
#[utoipa::path(
    post,
    path = "/files/upload",
    tag = "files",
    params(
        ("auth" = String, Header, description = "Shared secret")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded", body = UploadReceipt),
        (status = 400, description = "Missing file or file too large", body = ErrorResponse),
        (status = 401, description = "Missing or wrong auth header", body = ErrorResponse),
        (status = 503, description = "Storage unreachable", body = ErrorResponse),
        (status = 507, description = "No storage has room for the file", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadReceipt>, HttpAppError> {
    let form = extract_upload(multipart).await?;
    validate_file_size(form.data.len() as u64, state.config.max_file_size_bytes)?;

    let file_id = new_file_id(form.original_filename.as_deref());
    let filename = form
        .filename
        .or(form.original_filename)
        .unwrap_or_else(|| "unknown".to_string());
    let mime_type = form
        .mime_type
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
    let base_url = request_base_url(&state.config, &headers);

    tracing::debug!(
        file_id = %file_id,
        filename = %filename,
        mime_type = %mime_type,
        size_bytes = form.data.len(),
        "Storing upload"
    );

    let receipt = state
        .backend
        .put(&file_id, &filename, &mime_type, form.data, &base_url)
        .await?;

    Ok(Json(receipt))
}
