//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p sharedfiles-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use object_store::memory::InMemory;
use object_store::path::Path;
use sharedfiles_api::setup::routes;
use sharedfiles_api::state::AppState;
use sharedfiles_core::config::BaseConfig;
use sharedfiles_core::Config;
use sharedfiles_storage::{Backend, LocalStore, ObjectStorePool, Pool, PoolStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_TOKEN: &str = "test-secret";
pub const PUBLIC_BASE_URL: &str = "http://files.test";
pub const MAX_FILE_SIZE: u64 = 4096;

/// Test application: server plus owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub backend: Arc<dyn Backend>,
    pub _temp_dir: Option<TempDir>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config() -> Config {
    Config {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
        },
        authorization_token: TEST_TOKEN.to_string(),
        max_file_size_bytes: MAX_FILE_SIZE,
        public_base_url: Some(PUBLIC_BASE_URL.to_string()),
        remote_storage_url: None,
        pools: Vec::new(),
        pool_timeout_secs: 1,
        local_storage_path: "./uploads".to_string(),
        local_metadata_db: "metadata.db".to_string(),
        local_capacity_bytes: 2048,
    }
}

fn build(backend: Arc<dyn Backend>, temp_dir: Option<TempDir>) -> TestApp {
    let config = test_config();
    let state = Arc::new(AppState::new(config.clone(), backend.clone()));
    let router = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        backend,
        _temp_dir: temp_dir,
    }
}

/// App backed by local storage in a temp directory (2 KiB per-file ceiling).
pub async fn setup_local_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config();
    let store = LocalStore::open(
        temp_dir.path().join("uploads"),
        temp_dir.path().join("metadata.db"),
        config.local_capacity_bytes,
    )
    .await
    .expect("Failed to open local store");

    build(Arc::new(store), Some(temp_dir))
}

/// In-memory pool client.
pub fn memory_pool() -> Arc<ObjectStorePool> {
    Arc::new(ObjectStorePool::new(Arc::new(InMemory::new()), Path::from("")))
}

/// App backed by the given pools, in priority order.
pub fn setup_pool_app(pools: Vec<Pool>) -> TestApp {
    let store = PoolStore::new(pools, Duration::from_secs(1)).expect("Failed to build pool store");

    build(Arc::new(store), None)
}

pub fn file_form(data: &[u8], file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::copy_from_slice(data))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    MultipartForm::new().add_part("file", part)
}

/// Upload with the test token and return the parsed JSON body.
pub async fn upload(client: &TestServer, data: &[u8], file_name: &str, mime_type: &str) -> serde_json::Value {
    let response = client
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(file_form(data, file_name, mime_type))
        .await;

    assert_eq!(response.status_code(), 200, "upload failed: {}", response.text());
    response.json()
}
