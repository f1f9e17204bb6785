//! Storage abstraction trait
//!
//! This module defines the `Backend` trait that both storage variants implement,
//! and the errors they share.

use async_trait::async_trait;
use bytes::Bytes;
use sharedfiles_core::models::PoolStatus;
use sharedfiles_core::{BackendKind, FileRecord, UploadReceipt};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// No pool (or the local ceiling) can hold the payload. Terminal for the request.
    #[error("Capacity exhausted: no storage has room for {required} bytes")]
    CapacityExhausted { required: u64 },

    /// A pool or connection could not be reached (or timed out).
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file id: {0}")]
    InvalidKey(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Metadata(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A file read back from a backend: its metadata and full content.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub record: FileRecord,
    pub content: Bytes,
}

/// Outcome of a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageStatus {
    /// One entry per pool, in pool order. Broken pools appear as `ERROR` entries.
    Pools(Vec<PoolStatus>),
    /// The active backend has no remote pools to report on.
    Unsupported,
}

/// Storage backend trait
///
/// Implemented by `PoolStore` and `LocalStore`. Exactly one implementation is
/// chosen at startup and every file operation is delegated to it unchanged.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Store `data` under `id` and return the id and its locator.
    ///
    /// The locator is `{base_url}/files/{id}`, fixed at write time.
    async fn put(
        &self,
        id: &str,
        filename: &str,
        mime_type: &str,
        data: Bytes,
        base_url: &str,
    ) -> StorageResult<UploadReceipt>;

    /// Fetch metadata and content. Fails with `NotFound` when no storage holds the id.
    async fn get(&self, id: &str) -> StorageResult<StoredFile>;

    /// Remove content and metadata. Returns `true` only when the id existed and was removed.
    async fn delete(&self, id: &str) -> StorageResult<bool>;

    /// Every stored record.
    async fn list(&self) -> StorageResult<Vec<FileRecord>>;

    /// Per-pool health report, or `Unsupported` for local storage.
    async fn status(&self) -> StorageResult<StorageStatus>;

    /// Largest payload a `put` could accept right now.
    ///
    /// For pools this is the most free space left in any reachable pool; for local
    /// storage it is the static per-file ceiling.
    async fn remaining_capacity(&self) -> StorageResult<u64>;

    /// Get the storage backend type
    fn kind(&self) -> BackendKind;
}
