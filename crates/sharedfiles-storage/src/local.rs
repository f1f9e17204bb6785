use crate::keys::validate_file_id;
use crate::traits::{Backend, StorageError, StorageResult, StorageStatus, StoredFile};
use async_trait::async_trait;
use bytes::Bytes;
use sharedfiles_core::{AppError, BackendKind, FileRecord, UploadReceipt};
use sharedfiles_db::{connect_metadata_store, FileRecordRepository};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

fn metadata_error(err: AppError) -> StorageError {
    StorageError::Metadata(err.to_string())
}

/// Local filesystem storage with SQLite metadata
///
/// Content lives in `base_path/<id>`, one row per file in the metadata table.
/// Every upload is checked against a single per-file ceiling; there is no
/// aggregate quota.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
    capacity_bytes: u64,
    records: FileRecordRepository,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Directory for file content (created if missing)
    /// * `capacity_bytes` - Largest accepted payload
    /// * `records` - Metadata repository
    pub async fn new(
        base_path: impl Into<PathBuf>,
        capacity_bytes: u64,
        records: FileRecordRepository,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            capacity_bytes,
            records,
        })
    }

    /// Open the metadata database at `metadata_db` and the content directory at `base_path`.
    pub async fn open(
        base_path: impl Into<PathBuf>,
        metadata_db: impl AsRef<Path>,
        capacity_bytes: u64,
    ) -> StorageResult<Self> {
        let pool = connect_metadata_store(metadata_db).await.map_err(|e| {
            StorageError::ConfigError(format!("Failed to open metadata store: {:#}", e))
        })?;

        Self::new(base_path, capacity_bytes, FileRecordRepository::new(pool)).await
    }

    fn id_to_path(&self, id: &str) -> StorageResult<PathBuf> {
        validate_file_id(id)?;
        Ok(self.base_path.join(id))
    }

    /// Write a new file at `path`. Never replaces an existing file.
    ///
    /// A file this call created is removed again if writing it fails.
    async fn write_content(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::UploadFailed(format!(
                    "File {} already exists",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let written = match file.write_all(data).await {
            Ok(()) => file.sync_all().await,
            Err(e) => Err(e),
        };
        drop(file);

        if let Err(e) = written {
            self.discard_content(path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            )));
        }

        Ok(())
    }

    async fn remove_content(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove content written by a failed upload, logging when that fails too.
    async fn discard_content(&self, path: &Path) {
        if let Err(e) = self.remove_content(path).await {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to remove content of a failed upload"
            );
        }
    }
}

#[async_trait]
impl Backend for LocalStore {
    async fn put(
        &self,
        id: &str,
        filename: &str,
        mime_type: &str,
        data: Bytes,
        base_url: &str,
    ) -> StorageResult<UploadReceipt> {
        let path = self.id_to_path(id)?;
        let size = data.len() as u64;

        if size > self.capacity_bytes {
            tracing::warn!(
                file_id = %id,
                size_bytes = size,
                capacity_bytes = self.capacity_bytes,
                "Upload exceeds local capacity"
            );
            return Err(StorageError::CapacityExhausted { required: size });
        }

        let start = std::time::Instant::now();
        let record = FileRecord::new(id, filename, mime_type, &data, base_url);

        self.write_content(&path, &data).await?;

        if let Err(e) = self.records.insert(&record).await {
            self.discard_content(&path).await;
            return Err(metadata_error(e));
        }

        tracing::info!(
            path = %path.display(),
            file_id = %id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(UploadReceipt::from(&record))
    }

    async fn get(&self, id: &str) -> StorageResult<StoredFile> {
        let path = self.id_to_path(id)?;

        let record = self
            .records
            .get(id)
            .await
            .map_err(metadata_error)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), file_id = %id, "Metadata present but content missing");
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(StoredFile {
            record,
            content: Bytes::from(content),
        })
    }

    async fn delete(&self, id: &str) -> StorageResult<bool> {
        let path = self.id_to_path(id)?;

        if self.records.get(id).await.map_err(metadata_error)?.is_none() {
            return Ok(false);
        }

        self.remove_content(&path).await?;
        let removed = self.records.delete(id).await.map_err(metadata_error)?;

        tracing::info!(path = %path.display(), file_id = %id, "Local storage delete successful");
        Ok(removed)
    }

    async fn list(&self) -> StorageResult<Vec<FileRecord>> {
        self.records.list().await.map_err(metadata_error)
    }

    async fn status(&self) -> StorageResult<StorageStatus> {
        Ok(StorageStatus::Unsupported)
    }

    async fn remaining_capacity(&self) -> StorageResult<u64> {
        Ok(self.capacity_bytes)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;
    const BASE_URL: &str = "http://localhost:8000";

    async fn local_store(capacity_bytes: u64) -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(
            dir.path().join("uploads"),
            dir.path().join("metadata.db"),
            capacity_bytes,
        )
        .await
        .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let (dir, store) = local_store(MB).await;

        let receipt = store
            .put("a.txt", "notes.txt", "text/plain", Bytes::from_static(b"hello"), BASE_URL)
            .await
            .unwrap();
        assert_eq!(receipt.url, "http://localhost:8000/files/a.txt");
        assert!(dir.path().join("uploads").join("a.txt").exists());

        let file = store.get("a.txt").await.unwrap();
        assert_eq!(file.content, Bytes::from_static(b"hello"));
        assert_eq!(file.record.filename, "notes.txt");
        assert_eq!(file.record.size_bytes, 5);

        assert!(store.delete("a.txt").await.unwrap());
        assert!(!dir.path().join("uploads").join("a.txt").exists());
        assert!(matches!(
            store.get("a.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(!store.delete("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn oversized_upload_writes_nothing() {
        let (dir, store) = local_store(100 * MB).await;
        let data = Bytes::from(vec![0u8; (101 * MB) as usize]);

        let err = store
            .put("huge.bin", "huge.bin", "application/octet-stream", data, BASE_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::CapacityExhausted { required } if required == 101 * MB));
        assert!(!dir.path().join("uploads").join("huge.bin").exists());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_at_exact_capacity_is_accepted() {
        let (_dir, store) = local_store(16).await;
        assert!(store
            .put("edge.bin", "edge.bin", "application/octet-stream", Bytes::from(vec![1u8; 16]), BASE_URL)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn metadata_failure_removes_content() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect_metadata_store(dir.path().join("metadata.db"))
            .await
            .unwrap();
        let store = LocalStore::new(
            dir.path().join("uploads"),
            MB,
            FileRecordRepository::new(pool.clone()),
        )
        .await
        .unwrap();
        pool.close().await;

        let err = store
            .put("b.png", "b.png", "image/png", Bytes::from_static(b"png"), BASE_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Metadata(_)));
        assert!(!dir.path().join("uploads").join("b.png").exists());
    }

    #[tokio::test]
    async fn duplicate_id_keeps_existing_file() {
        let (_dir, store) = local_store(MB).await;
        store
            .put("a.txt", "a.txt", "text/plain", Bytes::from_static(b"original"), BASE_URL)
            .await
            .unwrap();

        let err = store
            .put("a.txt", "b.txt", "text/plain", Bytes::from_static(b"other"), BASE_URL)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));

        let file = store.get("a.txt").await.unwrap();
        assert_eq!(file.content, Bytes::from_static(b"original"));
        assert_eq!(file.record.filename, "a.txt");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn orphaned_file_without_row_is_not_overwritten() {
        let (dir, store) = local_store(MB).await;
        let path = dir.path().join("uploads").join("stray.bin");
        std::fs::write(&path, b"stray").unwrap();

        assert!(store
            .put("stray.bin", "stray.bin", "application/octet-stream", Bytes::from_static(b"new"), BASE_URL)
            .await
            .is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"stray");
        assert!(matches!(store.get("stray.bin").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_returns_every_record() {
        let (_dir, store) = local_store(MB).await;
        for id in ["1.txt", "2.txt", "3.txt"] {
            store
                .put(id, id, "text/plain", Bytes::from_static(b"x"), BASE_URL)
                .await
                .unwrap();
        }

        let mut ids: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["1.txt", "2.txt", "3.txt"]);
    }

    #[tokio::test]
    async fn status_is_unsupported_and_capacity_is_ceiling() {
        let (_dir, store) = local_store(100 * MB).await;
        assert_eq!(store.status().await.unwrap(), StorageStatus::Unsupported);
        assert_eq!(store.remaining_capacity().await.unwrap(), 100 * MB);
        assert_eq!(store.kind(), BackendKind::Local);
    }

    #[tokio::test]
    async fn traversal_ids_are_rejected() {
        let (_dir, store) = local_store(MB).await;
        assert!(matches!(
            store
                .put("../evil", "evil", "text/plain", Bytes::from_static(b"x"), BASE_URL)
                .await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("../metadata.db").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn dotted_ids_are_plain_names() {
        let (_dir, store) = local_store(MB).await;
        assert!(matches!(
            store.get("report..pdf").await,
            Err(StorageError::NotFound(_))
        ));

        store
            .put("report..pdf", "report..pdf", "application/pdf", Bytes::from_static(b"%PDF"), BASE_URL)
            .await
            .unwrap();
        assert_eq!(store.get("report..pdf").await.unwrap().content, Bytes::from_static(b"%PDF"));
    }
}
