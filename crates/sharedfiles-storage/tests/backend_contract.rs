//! Behaviour every backend must share, exercised through `Arc<dyn Backend>`.

use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path;
use sharedfiles_storage::{
    Backend, LocalStore, ObjectStorePool, Pool, PoolStore, StorageError, StorageStatus,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const BASE_URL: &str = "http://files.example.com";

fn pool_backend() -> Arc<dyn Backend> {
    let pools = ["fire", "valley"]
        .into_iter()
        .map(|name| {
            let client = ObjectStorePool::new(Arc::new(InMemory::new()), Path::from(""));
            Pool::new(name, 1024 * 1024, Arc::new(client))
        })
        .collect();
    Arc::new(PoolStore::new(pools, Duration::from_secs(5)).unwrap())
}

async fn local_backend(dir: &tempfile::TempDir) -> Arc<dyn Backend> {
    let store = LocalStore::open(
        dir.path().join("uploads"),
        dir.path().join("metadata.db"),
        1024 * 1024,
    )
    .await
    .unwrap();
    Arc::new(store)
}

fn new_id(ext: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), ext)
}

async fn exercise(backend: Arc<dyn Backend>) {
    let id = new_id("png");
    let data = Bytes::from_static(b"\x89PNG\r\n\x1a\nfake");

    let receipt = backend
        .put(&id, "cat.png", "image/png", data.clone(), BASE_URL)
        .await
        .unwrap();
    assert_eq!(receipt.file_id, id);
    assert_eq!(receipt.url, format!("{}/files/{}", BASE_URL, id));

    let file = backend.get(&id).await.unwrap();
    assert_eq!(file.content, data);
    assert_eq!(file.record.filename, "cat.png");
    assert_eq!(file.record.mime_type, "image/png");
    assert_eq!(file.record.size_bytes, data.len() as u64);
    assert_eq!(file.record.url, receipt.url);

    let listed = backend.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], file.record);

    assert!(backend.delete(&id).await.unwrap());
    assert!(matches!(backend.get(&id).await, Err(StorageError::NotFound(_))));
    assert!(!backend.delete(&id).await.unwrap());
    assert!(backend.list().await.unwrap().is_empty());

    let oversized = Bytes::from(vec![0u8; 1024 * 1024 + 1]);
    assert!(matches!(
        backend
            .put(&new_id("bin"), "big.bin", "application/octet-stream", oversized, BASE_URL)
            .await,
        Err(StorageError::CapacityExhausted { .. })
    ));
    assert!(backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn pool_backend_honours_contract() {
    exercise(pool_backend()).await;
}

#[tokio::test]
async fn local_backend_honours_contract() {
    let dir = tempfile::tempdir().unwrap();
    exercise(local_backend(&dir).await).await;
}

#[tokio::test]
async fn status_depends_on_backend() {
    let StorageStatus::Pools(pools) = pool_backend().status().await.unwrap() else {
        panic!("pool backend should report pools");
    };
    assert_eq!(pools.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        local_backend(&dir).await.status().await.unwrap(),
        StorageStatus::Unsupported
    );
}
