//! File API integration tests against pool storage.
//!
//! Run with: `cargo test -p sharedfiles-api --test pools_test`

mod helpers;

use async_trait::async_trait;
use bytes::Bytes;
use helpers::{file_form, memory_pool, setup_pool_app, upload, TEST_TOKEN};
use sharedfiles_core::FileRecord;
use sharedfiles_storage::{Pool, PoolClient, PoolStats, StorageError, StorageResult, StoredFile};
use std::sync::Arc;

/// Every call fails as if the pool were down.
struct DownPool;

fn down() -> StorageError {
    StorageError::BackendUnavailable("connection refused".to_string())
}

#[async_trait]
impl PoolClient for DownPool {
    async fn used_bytes(&self) -> StorageResult<u64> {
        Err(down())
    }

    async fn put(&self, _record: &FileRecord, _data: Bytes) -> StorageResult<()> {
        Err(down())
    }

    async fn find(&self, _id: &str) -> StorageResult<Option<StoredFile>> {
        Err(down())
    }

    async fn delete(&self, _id: &str) -> StorageResult<bool> {
        Err(down())
    }

    async fn list(&self) -> StorageResult<Vec<FileRecord>> {
        Err(down())
    }

    async fn stats(&self) -> StorageResult<PoolStats> {
        Err(down())
    }
}

#[tokio::test]
async fn uploads_fill_pools_in_order() {
    let fire = memory_pool();
    let valley = memory_pool();
    let app = setup_pool_app(vec![
        Pool::new("fire", 1000, fire.clone()),
        Pool::new("valley", 10_000, valley.clone()),
    ]);
    let client = app.client();

    let first = upload(client, &[1u8; 800], "a.bin", "application/octet-stream").await;
    let second = upload(client, &[2u8; 800], "b.bin", "application/octet-stream").await;

    let first_id = first["file_id"].as_str().unwrap();
    let second_id = second["file_id"].as_str().unwrap();
    assert!(fire.find(first_id).await.unwrap().is_some());
    assert!(valley.find(second_id).await.unwrap().is_some());

    let response = client.get(&format!("/files/{}", second_id)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().len(), 800);

    let list: Vec<serde_json::Value> = client.get("/files/").await.json();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["file_id"], first_id);
    assert_eq!(list[1]["file_id"], second_id);
}

#[tokio::test]
async fn full_pools_answer_insufficient_storage() {
    let app = setup_pool_app(vec![Pool::new("tiny", 100, memory_pool())]);

    let response = app
        .client()
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(file_form(&[0u8; 200], "x.bin", "application/octet-stream"))
        .await;

    assert_eq!(response.status_code(), 507);
}

#[tokio::test]
async fn unreachable_storage_answers_service_unavailable() {
    let app = setup_pool_app(vec![Pool::new("down", 10_000, Arc::new(DownPool))]);

    let response = app
        .client()
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(file_form(b"data", "x.bin", "application/octet-stream"))
        .await;
    assert_eq!(response.status_code(), 503);

    let health: serde_json::Value = app.client().get("/health").await.json();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["backend"], "pool");
}

#[tokio::test]
async fn clusters_report_every_pool() {
    let fire = memory_pool();
    let app = setup_pool_app(vec![
        Pool::new("fire", 1000, fire.clone()),
        Pool::new("down", 1000, Arc::new(DownPool)),
    ]);
    let client = app.client();
    upload(client, &[0u8; 250], "a.png", "image/png").await;

    let response = client
        .get("/files/clusters")
        .add_header("auth", TEST_TOKEN)
        .await;
    assert_eq!(response.status_code(), 200);

    let pools: Vec<serde_json::Value> = response.json();
    assert_eq!(pools.len(), 2);

    assert_eq!(pools[0]["name"], "fire");
    assert_eq!(pools[0]["status"], "OK");
    assert_eq!(pools[0]["used_bytes"], 250);
    assert_eq!(pools[0]["available_bytes"], 750);
    assert_eq!(pools[0]["files_count"]["total"], 1);
    assert_eq!(pools[0]["files_count"]["by_type"]["image/png"], 1);

    assert_eq!(pools[1]["name"], "down");
    assert_eq!(pools[1]["status"], "ERROR");
    assert!(pools[1]["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn delete_reports_missing_ids() {
    let app = setup_pool_app(vec![Pool::new("fire", 1000, memory_pool())]);
    let client = app.client();

    let body = upload(client, b"bye", "bye.txt", "text/plain").await;
    let file_id = body["file_id"].as_str().unwrap();

    let delete = |id: String| {
        client
            .delete(&format!("/files/{}", id))
            .add_header("auth", TEST_TOKEN)
    };

    assert_eq!(delete(file_id.to_string()).await.status_code(), 200);
    assert_eq!(delete(file_id.to_string()).await.status_code(), 404);
}
