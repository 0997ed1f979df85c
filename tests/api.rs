use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use offline_sync_server::store::{FileRecordStore, MemoryRecordStore, RecordStore, StoreError};
use offline_sync_server::sync::{UserId, UserRecord};
use offline_sync_server::{app, AppState};

fn user_header() -> HeaderName {
    HeaderName::from_static("x-user-id")
}

fn server_with(store: Arc<dyn RecordStore>) -> TestServer {
    TestServer::new(app(AppState::new(store), None)).unwrap()
}

fn memory_server() -> TestServer {
    server_with(Arc::new(MemoryRecordStore::new()))
}

/// Store that fails every operation
struct UnavailableStore;

#[async_trait::async_trait]
impl RecordStore for UnavailableStore {
    async fn get(&self, _user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "store offline").into())
    }

    async fn put(&self, _user_id: &UserId, _record: &UserRecord) -> Result<(), StoreError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "store offline").into())
    }
}

#[tokio::test]
async fn test_health() {
    let server = memory_server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_push_then_pull() {
    let server = memory_server();
    let items = json!([{"id": "1", "text": "buy milk", "done": false}, {"id": "2"}]);

    let pushed = server
        .post("/api/sync/push")
        .add_header(user_header(), HeaderValue::from_static("alice"))
        .json(&json!({ "items": items, "lastSync": 1714564800000i64 }))
        .await;
    pushed.assert_status_ok();

    let pushed: Value = pushed.json();
    assert_eq!(pushed["success"], true);
    assert_eq!(pushed["synced"], 2);
    let server_timestamp = pushed["serverTimestamp"].as_i64().unwrap();

    let pulled = server
        .get("/api/sync/pull")
        .add_header(user_header(), HeaderValue::from_static("alice"))
        .await;
    pulled.assert_status_ok();

    let pulled: Value = pulled.json();
    assert_eq!(pulled["items"], items);
    assert_eq!(pulled["serverTimestamp"].as_i64().unwrap(), server_timestamp);
}

#[tokio::test]
async fn test_pull_unknown_user_is_empty() {
    let server = memory_server();
    let before = chrono::Utc::now().timestamp_millis();

    let pulled: Value = server
        .get("/api/sync/pull")
        .add_header(user_header(), HeaderValue::from_static("nobody"))
        .await
        .json();

    assert_eq!(pulled["items"], json!([]));
    assert!(pulled["serverTimestamp"].as_i64().unwrap() >= before);
}

#[tokio::test]
async fn test_missing_header_uses_default_user() {
    let store = Arc::new(MemoryRecordStore::new());
    let server = server_with(store.clone());

    server
        .post("/api/sync/push")
        .json(&json!({ "items": ["a", "b"] }))
        .await
        .assert_status_ok();

    let pulled: Value = server.get("/api/sync/pull").await.json();
    assert_eq!(pulled["items"], json!(["a", "b"]));

    let stored = store.get(&UserId::new("default")).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_users_are_isolated() {
    let server = memory_server();

    server
        .post("/api/sync/push")
        .add_header(user_header(), HeaderValue::from_static("alice"))
        .json(&json!({ "items": ["alice's"] }))
        .await
        .assert_status_ok();

    let bob: Value = server
        .get("/api/sync/pull")
        .add_header(user_header(), HeaderValue::from_static("bob"))
        .await
        .json();
    assert_eq!(bob["items"], json!([]));
}

#[tokio::test]
async fn test_second_push_overwrites_first() {
    let server = memory_server();

    let first: Value = server
        .post("/api/sync/push")
        .json(&json!({ "items": [1, 2, 3] }))
        .await
        .json();
    let second: Value = server
        .post("/api/sync/push")
        .json(&json!({ "items": [4] }))
        .await
        .json();

    assert!(second["serverTimestamp"].as_i64() >= first["serverTimestamp"].as_i64());

    let pulled: Value = server.get("/api/sync/pull").await.json();
    assert_eq!(pulled["items"], json!([4]));
}

#[tokio::test]
async fn test_push_without_items_is_rejected() {
    let store = Arc::new(MemoryRecordStore::new());
    let server = server_with(store.clone());

    let response = server
        .post("/api/sync/push")
        .json(&json!({ "lastSync": null }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
    assert!(store.get(&UserId::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_failure_returns_500() {
    let server = server_with(Arc::new(UnavailableStore));

    let pushed = server
        .post("/api/sync/push")
        .json(&json!({ "items": [] }))
        .expect_failure()
        .await;
    pushed.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = pushed.json();
    assert_eq!(body, json!({ "error": "store offline" }));

    let pulled = server.get("/api/sync/pull").expect_failure().await;
    pulled.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = pulled.json();
    assert!(body["error"].as_str().unwrap().contains("store offline"));
}

#[tokio::test]
async fn test_resolve_picks_requested_side() {
    let server = memory_server();

    for (resolution, expected) in [
        (json!("local"), "A"),
        (json!("server"), "B"),
        (json!("anything-else"), "B"),
        (json!(null), "B"),
    ] {
        let response = server
            .post("/api/sync/resolve")
            .json(&json!({
                "localVersion": "A",
                "serverVersion": "B",
                "resolution": resolution,
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["resolved"], true);
        assert_eq!(body["winner"], expected);
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_resolve_does_not_touch_store() {
    let store = Arc::new(MemoryRecordStore::new());
    let server = server_with(store.clone());

    server
        .post("/api/sync/resolve")
        .json(&json!({
            "localVersion": {"items": [1]},
            "serverVersion": {"items": [2]},
            "resolution": "local",
        }))
        .await
        .assert_status_ok();

    assert!(store.get(&UserId::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resolve_without_json_content_type_falls_back_to_server() {
    let server = memory_server();

    let response = server
        .post("/api/sync/resolve")
        .text(r#"{"localVersion":"A","serverVersion":"B","resolution":"local"}"#)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["resolved"], true);
    assert_eq!(body["winner"], Value::Null);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_file_store_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileRecordStore::open(temp_dir.path()).await.unwrap());
    let server = server_with(store);

    server
        .post("/api/sync/push")
        .add_header(user_header(), HeaderValue::from_static("carol"))
        .json(&json!({ "items": [{"id": "n1"}] }))
        .await
        .assert_status_ok();

    assert!(temp_dir.path().join("carol.json").exists());

    let pulled: Value = server
        .get("/api/sync/pull")
        .add_header(user_header(), HeaderValue::from_static("carol"))
        .await
        .json();
    assert_eq!(pulled["items"], json!([{"id": "n1"}]));
}

#[tokio::test]
async fn test_static_files_served_as_fallback() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("index.html"), "<h1>offline</h1>").unwrap();

    let state = AppState::new(Arc::new(MemoryRecordStore::new()));
    let server = TestServer::new(app(state, Some(temp_dir.path()))).unwrap();

    let response = server.get("/index.html").await;
    response.assert_status_ok();
    assert!(response.text().contains("offline"));

    server.get("/health").await.assert_status_ok();
}
