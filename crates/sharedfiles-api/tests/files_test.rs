//! File API integration tests against local storage.
//!
//! Run with: `cargo test -p sharedfiles-api --test files_test`

mod helpers;

use helpers::{file_form, setup_local_app, upload, PUBLIC_BASE_URL, TEST_TOKEN};

#[tokio::test]
async fn upload_get_list_delete_workflow() {
    let app = setup_local_app().await;
    let client = app.client();

    let body = upload(client, b"hello world", "greeting.txt", "text/plain").await;
    let file_id = body["file_id"].as_str().expect("file_id").to_string();
    assert!(file_id.ends_with(".txt"));
    assert_eq!(
        body["url"].as_str().unwrap(),
        format!("{}/files/{}", PUBLIC_BASE_URL, file_id)
    );

    let get_response = client.get(&format!("/files/{}", file_id)).await;
    assert_eq!(get_response.status_code(), 200);
    assert_eq!(get_response.as_bytes().as_ref(), b"hello world");
    assert_eq!(get_response.header("content-type"), "text/plain");
    assert_eq!(
        get_response.header("content-disposition"),
        "inline; filename=\"greeting.txt\""
    );

    let list: Vec<serde_json::Value> = client.get("/files/").await.json();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["file_id"], file_id.as_str());
    assert_eq!(list[0]["filename"], "greeting.txt");
    assert_eq!(list[0]["mimetype"], "text/plain");
    assert_eq!(list[0]["size"], 11);

    let delete_response = client
        .delete(&format!("/files/{}", file_id))
        .add_header("auth", TEST_TOKEN)
        .await;
    assert_eq!(delete_response.status_code(), 200);
    let detail: serde_json::Value = delete_response.json();
    assert_eq!(detail["detail"], "File deleted");

    assert_eq!(client.get(&format!("/files/{}", file_id)).await.status_code(), 404);
    let list: Vec<serde_json::Value> = client.get("/files/").await.json();
    assert!(list.is_empty());
}

#[tokio::test]
async fn filename_field_overrides_part_name() {
    let app = setup_local_app().await;
    let client = app.client();

    let form = file_form(b"\x89PNG", "IMG_0001.png", "image/png").add_text("filename", "holiday.png");
    let response = client
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);

    let file_id = response.json::<serde_json::Value>()["file_id"]
        .as_str()
        .unwrap()
        .to_string();
    let file = app.backend.get(&file_id).await.unwrap();
    assert_eq!(file.record.filename, "holiday.png");
    assert_eq!(file.record.mime_type, "image/png");
}

#[tokio::test]
async fn mutating_routes_require_auth() {
    let app = setup_local_app().await;
    let client = app.client();

    let missing = client
        .post("/files/upload")
        .multipart(file_form(b"x", "x.txt", "text/plain"))
        .await;
    assert_eq!(missing.status_code(), 401);

    let wrong = client
        .post("/files/upload")
        .add_header("auth", "not-the-token")
        .multipart(file_form(b"x", "x.txt", "text/plain"))
        .await;
    assert_eq!(wrong.status_code(), 401);

    assert_eq!(client.delete("/files/anything.txt").await.status_code(), 401);
    assert_eq!(client.get("/files/clusters").await.status_code(), 401);

    assert!(app.backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = setup_local_app().await;
    let response = app
        .client()
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(axum_test::multipart::MultipartForm::new().add_text("filename", "a.txt"))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn upload_over_max_file_size_is_rejected() {
    let app = setup_local_app().await;
    let data = vec![0u8; helpers::MAX_FILE_SIZE as usize + 1];

    let response = app
        .client()
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(file_form(&data, "big.bin", "application/octet-stream"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_over_local_capacity_is_insufficient_storage() {
    let app = setup_local_app().await;
    // Under MAX_FILE_SIZE but over the 2 KiB local ceiling.
    let data = vec![1u8; 3000];

    let response = app
        .client()
        .post("/files/upload")
        .add_header("auth", TEST_TOKEN)
        .multipart(file_form(&data, "mid.bin", "application/octet-stream"))
        .await;

    assert_eq!(response.status_code(), 507);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "CAPACITY_EXHAUSTED");
    assert!(app.backend.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_files_are_not_found() {
    let app = setup_local_app().await;
    let client = app.client();

    assert_eq!(client.get("/files/missing.png").await.status_code(), 404);
    assert_eq!(
        client
            .delete("/files/missing.png")
            .add_header("auth", TEST_TOKEN)
            .await
            .status_code(),
        404
    );
}

#[tokio::test]
async fn clusters_unavailable_for_local_storage() {
    let app = setup_local_app().await;
    let response = app
        .client()
        .get("/files/clusters")
        .add_header("auth", TEST_TOKEN)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn health_reports_backend() {
    let app = setup_local_app().await;
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "local");
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = setup_local_app().await;
    let client = app.client();

    let response = client.get("/health").add_header("x-request-id", "req-42").await;
    assert_eq!(response.header("x-request-id"), "req-42");
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");

    let generated = client.get("/files/missing.png").await;
    assert_eq!(generated.status_code(), 404);
    assert!(!generated.header("x-request-id").is_empty());
}

#[tokio::test]
async fn openapi_and_docs_are_served() {
    let app = setup_local_app().await;
    let client = app.client();

    let spec: serde_json::Value = client.get("/api/openapi.json").await.json();
    assert!(spec["paths"].get("/files/upload").is_some());

    assert_eq!(client.get("/docs").await.status_code(), 200);
}
