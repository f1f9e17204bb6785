use crate::traits::{StorageResult, StoredFile};
use async_trait::async_trait;
use bytes::Bytes;
use sharedfiles_core::FileRecord;
use std::collections::BTreeMap;

/// Usage figures for a single pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Bytes of stored content
    pub used_bytes: u64,
    /// File count per MIME type
    pub files_by_type: BTreeMap<String, u64>,
}

/// Connection to one remote pool.
///
/// A pool holds both the content and the metadata of the files placed in it, so
/// every operation here is self-contained. Errors from unreachable pools are
/// reported as `StorageError::BackendUnavailable`.
#[async_trait]
pub trait PoolClient: Send + Sync {
    /// Bytes of content currently stored.
    async fn used_bytes(&self) -> StorageResult<u64>;

    /// Write content and metadata. Content is written first and removed again if
    /// the metadata write fails.
    async fn put(&self, record: &FileRecord, data: Bytes) -> StorageResult<()>;

    /// Metadata and content for `id`, or `None` when this pool does not hold it.
    async fn find(&self, id: &str) -> StorageResult<Option<StoredFile>>;

    /// Remove `id`. Returns `false` when this pool does not hold it.
    async fn delete(&self, id: &str) -> StorageResult<bool>;

    /// Every record stored in this pool.
    async fn list(&self) -> StorageResult<Vec<FileRecord>>;

    async fn stats(&self) -> StorageResult<PoolStats>;
}
