//! Object-store backed pool client.
//!
//! Layout under the pool root:
//!
//! ```text
//! files/<id>        raw content
//! meta/<id>.json    serialized FileRecord
//! ```
//!
//! Used bytes are the summed sizes of everything under `files/`.

use super::client::{PoolClient, PoolStats};
use crate::traits::{StorageError, StorageResult, StoredFile};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectMeta, ObjectStore, ObjectStoreExt, PutPayload};
use sharedfiles_core::FileRecord;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const CONTENT_DIR: &str = "files";
const METADATA_DIR: &str = "meta";
const METADATA_FETCH_CONCURRENCY: usize = 8;

fn unavailable(err: ObjectStoreError) -> StorageError {
    StorageError::BackendUnavailable(err.to_string())
}

/// A pool living in any `object_store` backend (S3-compatible, filesystem, memory).
#[derive(Clone)]
pub struct ObjectStorePool {
    store: Arc<dyn ObjectStore>,
    root: Path,
}

impl ObjectStorePool {
    pub fn new(store: Arc<dyn ObjectStore>, root: Path) -> Self {
        Self { store, root }
    }

    /// Connect to the pool at `locator`, e.g. `s3://bucket/prefix`.
    ///
    /// `timeout` bounds every HTTP request made by remote stores.
    pub fn from_url(locator: &str, timeout: Duration) -> StorageResult<Self> {
        let url = Url::parse(locator)
            .map_err(|e| StorageError::ConfigError(format!("Invalid pool URL: {}", e)))?;

        let timeout = format!("{}s", timeout.as_secs().max(1));
        let options = [
            ("timeout", timeout.clone()),
            ("connect_timeout", timeout),
        ];

        let (store, root) = object_store::parse_url_opts(&url, options).map_err(|e| {
            StorageError::ConfigError(format!("Failed to open pool store: {}", e))
        })?;

        Ok(Self::new(Arc::from(store), root))
    }

    fn content_path(&self, id: &str) -> Path {
        self.root.child(CONTENT_DIR).child(id)
    }

    fn metadata_path(&self, id: &str) -> Path {
        self.root.child(METADATA_DIR).child(format!("{}.json", id))
    }

    async fn list_objects(&self, dir: &str) -> StorageResult<Vec<ObjectMeta>> {
        let prefix = self.root.child(dir);
        self.store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(unavailable)
    }

    async fn read_record(&self, location: &Path) -> StorageResult<Option<FileRecord>> {
        let bytes = match self.store.get(location).await {
            Ok(result) => result.bytes().await.map_err(unavailable)?,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(unavailable(e)),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn records(&self) -> StorageResult<Vec<FileRecord>> {
        let objects = self.list_objects(METADATA_DIR).await?;

        let results: Vec<(Path, StorageResult<Option<FileRecord>>)> =
            futures::stream::iter(objects)
                .map(|meta| async move {
                    let record = self.read_record(&meta.location).await;
                    (meta.location, record)
                })
                .buffer_unordered(METADATA_FETCH_CONCURRENCY)
                .collect()
                .await;

        let mut records = Vec::with_capacity(results.len());
        for (location, result) in results {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(StorageError::Metadata(e)) => {
                    tracing::warn!(location = %location, error = %e, "Skipping unreadable metadata");
                }
                Err(e) => return Err(e),
            }
        }

        records.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}

#[async_trait]
impl PoolClient for ObjectStorePool {
    async fn used_bytes(&self) -> StorageResult<u64> {
        let objects = self.list_objects(CONTENT_DIR).await?;
        Ok(objects.iter().map(|meta| meta.size as u64).sum())
    }

    async fn put(&self, record: &FileRecord, data: Bytes) -> StorageResult<()> {
        let content = self.content_path(&record.id);

        self.store
            .put(&content, PutPayload::from(data))
            .await
            .map_err(unavailable)?;

        let metadata = serde_json::to_vec(record)?;
        if let Err(e) = self
            .store
            .put(&self.metadata_path(&record.id), PutPayload::from(metadata))
            .await
        {
            if let Err(cleanup) = self.store.delete(&content).await {
                tracing::error!(
                    file_id = %record.id,
                    error = %cleanup,
                    "Failed to remove content after metadata write failure"
                );
            }
            return Err(StorageError::Metadata(format!(
                "Failed to write metadata for {}: {}",
                record.id, e
            )));
        }

        Ok(())
    }

    async fn find(&self, id: &str) -> StorageResult<Option<StoredFile>> {
        let Some(record) = self.read_record(&self.metadata_path(id)).await? else {
            return Ok(None);
        };

        let content = match self.store.get(&self.content_path(id)).await {
            Ok(result) => result.bytes().await.map_err(unavailable)?,
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::warn!(file_id = %id, "Metadata present but content missing");
                return Ok(None);
            }
            Err(e) => return Err(unavailable(e)),
        };

        Ok(Some(StoredFile { record, content }))
    }

    async fn delete(&self, id: &str) -> StorageResult<bool> {
        let metadata = self.metadata_path(id);
        match self.store.head(&metadata).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(unavailable(e)),
        }

        match self.store.delete(&self.content_path(id)).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => return Err(unavailable(e)),
        }

        match self.store.delete(&metadata).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => Ok(true),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn list(&self) -> StorageResult<Vec<FileRecord>> {
        self.records().await
    }

    async fn stats(&self) -> StorageResult<PoolStats> {
        let used_bytes = self.used_bytes().await?;

        let mut files_by_type = std::collections::BTreeMap::new();
        for record in self.records().await? {
            *files_by_type.entry(record.mime_type).or_insert(0) += 1;
        }

        Ok(PoolStats {
            used_bytes,
            files_by_type,
        })
    }
}
