//! End-to-end tests for the HTTP surface.
//!
//! Each test builds the full router over a fresh in-memory SQLite database
//! and drives it with `tower::ServiceExt::oneshot`, so no server or external
//! database is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use token_service::config::Config;
use token_service::store::TokenStore;
use token_service::{api, AppState};

async fn app_with(strict_status: bool) -> (Router, TokenStore) {
    let db = TokenStore::connect("sqlite::memory:", 1).await.unwrap();
    db.migrate().await.unwrap();

    let config = Config {
        strict_status,
        ..Config::default()
    };
    let state = Arc::new(AppState {
        db: db.clone(),
        config,
    });
    (api::router(state), db)
}

async fn app() -> (Router, TokenStore) {
    app_with(false).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_welcome() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"msg": "Hello world :)"}));
}

#[tokio::test]
async fn test_create_conflict_archive_reactivate_lifecycle() {
    let (app, db) = app().await;

    let (status, body) = send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "abc", "active": true}));

    let (status, body) = send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "token already exists and is active");
    assert_eq!(db.count().await.unwrap(), 1);

    let (status, body) =
        send(&app, Method::PATCH, "/tokens/1", Some(json!({"active": false}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "abc", "active": false}));

    let (status, body) = send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "abc", "active": true}));
    assert_eq!(db.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_filters_by_query() {
    let (app, _) = app().await;
    for name in ["one", "two", "three"] {
        send(&app, Method::POST, "/tokens", Some(json!({"name": name}))).await;
    }
    send(&app, Method::PATCH, "/tokens/2", Some(json!({"active": false}))).await;

    let (_, active) = send(&app, Method::GET, "/tokens", None).await;
    assert_eq!(
        active,
        json!([
            {"id": 1, "name": "one", "active": true},
            {"id": 3, "name": "three", "active": true},
        ])
    );

    let (_, inactive) = send(&app, Method::GET, "/tokens?query=inactive", None).await;
    assert_eq!(inactive, json!([{"id": 2, "name": "two", "active": false}]));

    // Unrecognised query values fall back to active tokens.
    let (_, other) = send(&app, Method::GET, "/tokens?query=everything", None).await;
    assert_eq!(other, active);
}

#[tokio::test]
async fn test_list_with_malformed_query_lists_active() {
    let (app, _) = app().await;
    send(&app, Method::POST, "/tokens", Some(json!({"name": "one"}))).await;
    send(&app, Method::POST, "/tokens", Some(json!({"name": "two"}))).await;
    send(&app, Method::PATCH, "/tokens/2", Some(json!({"active": false}))).await;

    let (status, body) = send(&app, Method::GET, "/tokens?query=a&query=b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "name": "one", "active": true}]));

    let (status, body) = send(&app, Method::GET, "/tokens?query=inactive&query=inactive", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "name": "one", "active": true}]));
}

#[tokio::test]
async fn test_create_keeps_padded_name_distinct() {
    let (app, db) = app().await;
    send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;

    let (status, body) = send(&app, Method::POST, "/tokens", Some(json!({"name": " abc"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 2, "name": " abc", "active": true}));
    assert_eq!(db.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_get_token() {
    let (app, _) = app().await;
    send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;

    let (status, body) = send(&app, Method::GET, "/tokens/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "abc", "active": true}));

    let (status, body) = send(&app, Method::GET, "/tokens/99", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "could not find token with id 99"}));

    let (_, body) = send(&app, Method::GET, "/tokens/abc", None).await;
    assert_eq!(body, json!({"error": "could not find token with id abc"}));
}

#[tokio::test]
async fn test_patch_missing_token() {
    let (app, db) = app().await;
    let (status, body) =
        send(&app, Method::PATCH, "/tokens/5", Some(json!({"active": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "could not find token with id 5"}));
    assert_eq!(db.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_bad_bodies_report_errors() {
    let (app, db) = app().await;

    let (_, body) = send(&app, Method::POST, "/tokens", Some(json!({"label": "abc"}))).await;
    assert!(body["error"].is_string());

    let (_, body) = send(&app, Method::POST, "/tokens", Some(json!({"name": "  "}))).await;
    assert_eq!(body["error"], "token name must not be empty");

    send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;
    let (_, body) =
        send(&app, Method::PATCH, "/tokens/1", Some(json!({"active": "no"}))).await;
    assert!(body["error"].is_string());
    assert!(db.get(1).await.unwrap().active);
}

#[tokio::test]
async fn test_strict_status_codes() {
    let (app, _) = app_with(true).await;
    send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;

    let (status, body) = send(&app, Method::POST, "/tokens", Some(json!({"name": "abc"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "token already exists and is active");

    let (status, _) = send(&app, Method::GET, "/tokens/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/tokens", Some(json!({"name": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/tokens/1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/token", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_health_and_headers() {
    let (app, _) = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _) = app().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/tokens")
        .header("origin", "https://example.org")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
