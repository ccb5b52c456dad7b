//! Integration tests for fpsync-gateway API endpoints
//!
//! Tests cover:
//! - API key enforcement on /fetch and /update
//! - Fetch/acknowledge round trip against SQLite
//! - Request validation (empty ids, malformed JSON, legacy bare array)
//! - Error envelope for datastore failures, unknown routes and oversized bodies
//! - Health endpoint (no auth required)

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fpsync_common::store::{MemoryRecordStore, SqliteRecordStore};
use fpsync_common::{AccessGuard, SyncCoordinator};
use fpsync_gateway::{build_router, AppState};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::util::ServiceExt; // for `oneshot` method

const API_KEY: &str = "test-key";

/// Test helper: app over an in-memory store seeded with `n` records
async fn memory_app(n: usize) -> (Router, Arc<MemoryRecordStore>) {
    let store = MemoryRecordStore::new_shared();
    for i in 0..n {
        store.insert(&format!("{}", 100 + i), "attlog", "cloud").await;
    }

    let state = AppState::new(
        SyncCoordinator::new(store.clone()),
        AccessGuard::new(API_KEY).unwrap(),
    );
    (build_router(state), store)
}

/// Test helper: app over an in-memory SQLite table seeded with ids 1..=n
async fn sqlite_app(n: i64) -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");

    sqlx::query(
        r#"
        CREATE TABLE tb_fps (
            id INTEGER PRIMARY KEY,
            pin TEXT,
            attlog TEXT,
            cloud_id TEXT,
            is_fetched INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    for id in 1..=n {
        sqlx::query("INSERT INTO tb_fps (id, pin, attlog, cloud_id) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(format!("{}", 1000 + id))
            .bind(format!("1\t2024-05-01 08:0{}:00\t1\t0", id))
            .bind("cloud-7")
            .execute(&pool)
            .await
            .unwrap();
    }

    let state = AppState::new(
        SyncCoordinator::new(Arc::new(SqliteRecordStore::new(pool.clone()))),
        AccessGuard::new(API_KEY).unwrap(),
    );
    (build_router(state), pool)
}

fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn data_ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

async fn fetched_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tb_fps WHERE is_fetched = 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_fetch_without_key_is_unauthorized() {
    let (app, store) = memory_app(3).await;

    let response = app.oneshot(get("/fetch", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], 401);
    assert!(body["message"].is_string());
    assert!(body.get("data").is_none());
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_update_with_wrong_key_changes_nothing() {
    let (app, pool) = sqlite_app(3).await;

    let response = app
        .oneshot(post("/update", Some("wrong-key"), r#"{"ids":[1,2,3]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(fetched_count(&pool).await, 0);
}

#[tokio::test]
async fn test_update_without_key_changes_nothing() {
    let (app, store) = memory_app(3).await;

    let response = app
        .oneshot(post("/update", None, r#"{"ids":[1]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.calls(), 0);
    assert_eq!(store.fetched_count().await, 0);
}

#[tokio::test]
async fn test_header_name_is_case_insensitive() {
    let (app, _store) = memory_app(1).await;

    let request = Request::builder()
        .uri("/fetch")
        .header("X-API-KEY", API_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Fetch / acknowledge
// =============================================================================

#[tokio::test]
async fn test_fetch_response_shape() {
    let (app, pool) = sqlite_app(2).await;

    let response = app.oneshot(get("/fetch", Some(API_KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["message"], "success");

    let first = &body["data"][0];
    assert_eq!(first["id"], 1);
    assert_eq!(first["pin"], "1001");
    assert!(first["attlog"].as_str().unwrap().starts_with("1\t2024-05-01"));
    assert_eq!(first["cloud_id"], "cloud-7");

    // Fetch alone marks nothing
    assert_eq!(fetched_count(&pool).await, 0);
}

#[tokio::test]
async fn test_round_trip() {
    let (app, pool) = sqlite_app(3).await;

    let response = app
        .clone()
        .oneshot(get("/fetch", Some(API_KEY)))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(data_ids(&body), vec![1, 2, 3]);

    let response = app
        .clone()
        .oneshot(post("/update", Some(API_KEY), r#"{"ids":[1,2]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, serde_json::json!({"code": 200, "message": "success"}));

    let response = app.oneshot(get("/fetch", Some(API_KEY))).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(data_ids(&body), vec![3]);
    assert_eq!(fetched_count(&pool).await, 2);
}

#[tokio::test]
async fn test_fetch_with_nothing_pending_returns_empty_array() {
    let (app, _pool) = sqlite_app(0).await;

    let response = app.oneshot(get("/fetch", Some(API_KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_ack_is_idempotent() {
    let (app, pool) = sqlite_app(2).await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post("/update", Some(API_KEY), r#"{"ids":[1,2]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(fetched_count(&pool).await, 2);
}

#[tokio::test]
async fn test_unknown_id_is_ok() {
    let (app, pool) = sqlite_app(1).await;

    let response = app
        .oneshot(post("/update", Some(API_KEY), r#"{"ids":[424242]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fetched_count(&pool).await, 0);
}

#[tokio::test]
async fn test_legacy_bare_array_body() {
    let (app, store) = memory_app(3).await;

    let response = app
        .oneshot(post("/update", Some(API_KEY), "[2, 3]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.is_fetched(1).await, Some(false));
    assert_eq!(store.is_fetched(2).await, Some(true));
    assert_eq!(store.is_fetched(3).await, Some(true));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_empty_ids_rejected_before_store() {
    let (app, store) = memory_app(3).await;

    let response = app
        .oneshot(post("/update", Some(API_KEY), r#"{"ids":[]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], 400);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_rejected() {
    let (app, store) = memory_app(3).await;

    for body in [
        "{not json",
        "",
        r#"{"ids":"1,2"}"#,
        r#"{"ids":[1.5]}"#,
        r#"{"id":[1]}"#,
    ] {
        let response = app
            .clone()
            .oneshot(post("/update", Some(API_KEY), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {:?}", body);

        let json = extract_json(response.into_body()).await;
        assert_eq!(json["code"], 400);
    }
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let store = MemoryRecordStore::new_shared();
    let mut state = AppState::new(
        SyncCoordinator::new(store.clone()),
        AccessGuard::new(API_KEY).unwrap(),
    );
    state.max_body_bytes = 64;
    let app = build_router(state);

    let ids: Vec<String> = (1..=100).map(|i| i.to_string()).collect();
    let body = format!(r#"{{"ids":[{}]}}"#, ids.join(","));

    let response = app
        .oneshot(post("/update", Some(API_KEY), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["code"], 413);
    assert_eq!(store.calls(), 0);
}

// =============================================================================
// Datastore failures
// =============================================================================

#[tokio::test]
async fn test_storage_failure_hides_details() {
    let (app, store) = memory_app(3).await;
    store.set_unavailable(true).await;

    let response = app
        .clone()
        .oneshot(get("/fetch", Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], 500);
    assert_eq!(body["message"], "Database error");

    let response = app
        .oneshot(post("/update", Some(API_KEY), r#"{"ids":[1]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_fault_mid_batch_marks_nothing() {
    let (app, store) = memory_app(5).await;
    store.fail_on_id(Some(4)).await;

    let response = app
        .oneshot(post("/update", Some(API_KEY), r#"{"ids":[1,2,3,4,5]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.fetched_count().await, 0);
}

// =============================================================================
// Health, routing and headers
// =============================================================================

#[tokio::test]
async fn test_health_no_auth_required() {
    let (app, _store) = memory_app(0).await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "fpsync-gateway");
    assert_eq!(body["database"], "up");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_degraded_when_store_down() {
    let (app, store) = memory_app(0).await;
    store.set_unavailable(true).await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "down");
}

#[tokio::test]
async fn test_unknown_route_returns_envelope() {
    let (app, _store) = memory_app(0).await;

    let response = app
        .oneshot(get("/records", Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let (app, _store) = memory_app(0).await;

    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    let generated = response
        .headers()
        .get("x-request-id")
        .expect("request id should be set");
    assert!(!generated.is_empty());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}
