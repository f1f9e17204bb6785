//! File metadata model.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity and metadata of one stored file.
///
/// The JSON field names follow the public API (`file_id`, `mimetype`, `size`,
/// `upload_date`). `url` is fixed at upload time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    /// Storage key, unique across every backend; includes the original extension
    #[serde(rename = "file_id")]
    #[schema(example = "e8f6a274-c8f1-4b87-919e-24e73e4f6fa6.png")]
    pub id: String,
    pub filename: String,
    #[serde(rename = "mimetype")]
    #[schema(example = "image/png")]
    pub mime_type: String,
    /// Length of the stored content in bytes
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "upload_date")]
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
}

impl FileRecord {
    /// Build the record for a new upload.
    ///
    /// `size_bytes` comes from the content itself, `uploaded_at` from the local
    /// clock (millisecond precision so it survives every metadata store intact).
    pub fn new(id: &str, filename: &str, mime_type: &str, data: &[u8], base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: data.len() as u64,
            uploaded_at: Utc::now().trunc_subsecs(3),
            url: file_url(base_url, id),
        }
    }
}

/// Locator for a stored file: `{base_url}/files/{id}`.
pub fn file_url(base_url: &str, id: &str) -> String {
    format!("{}/files/{}", base_url.trim_end_matches('/'), id)
}

/// What the caller gets back from a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadReceipt {
    pub file_id: String,
    pub url: String,
}

impl From<&FileRecord> for UploadReceipt {
    fn from(record: &FileRecord) -> Self {
        Self {
            file_id: record.id.clone(),
            url: record.url.clone(),
        }
    }
}
