//! HTTP API Integration Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use content_hub::api::{create_router, AppState};
use content_hub::{Registry, RegistryConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup() -> (axum::Router, TempDir) {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("shared/components");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("demo.html"), "<p>demo</p>").await.unwrap();

    let registry = Registry::new(RegistryConfig::new(temp.path()).with_site_root("")).unwrap();
    let app = create_router(AppState::new(Arc::new(registry)));
    (app, temp)
}

async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let mut request = Request::builder().method(method).uri(path);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = match body {
        Some(json_body) => request.body(Body::from(json_body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).ok();

    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (app, _temp) = setup().await;

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "content-hub");
}

#[tokio::test]
async fn test_list_initializes_lazily() {
    let (app, _temp) = setup().await;

    let (status, body) = make_request(&app, Method::GET, "/api/components", None).await;
    assert_eq!(status, StatusCode::OK);

    let list = body.unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "demo");
    assert_eq!(list[0]["locationType"], "shared");
}

#[tokio::test]
async fn test_get_unknown_is_404() {
    let (app, _temp) = setup().await;

    let (status, body) = make_request(&app, Method::GET, "/api/components/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.unwrap()["error"].is_string());
}

#[tokio::test]
async fn test_put_registers_component() {
    let (app, _temp) = setup().await;

    let (status, body) = make_request(
        &app,
        Method::PUT,
        "/api/components/demo",
        Some(json!({ "title": "Demo Widget", "tags": ["demo"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["id"], "demo");
    assert_eq!(body["title"], "Demo Widget");
    assert_eq!(body["url"], "/shared/components/demo.html");

    let (status, body) = make_request(&app, Method::GET, "/api/components/demo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["title"], "Demo Widget");
}

#[tokio::test]
async fn test_put_id_mismatch_is_400() {
    let (app, _temp) = setup().await;

    let (status, _) = make_request(
        &app,
        Method::PUT,
        "/api/components/demo",
        Some(json!({ "id": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete() {
    let (app, temp) = setup().await;

    let (status, body) = make_request(&app, Method::DELETE, "/api/components/demo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["success"], true);
    assert!(!temp.path().join("shared/components/demo.html").exists());

    let (status, _) = make_request(&app, Method::DELETE, "/api/components/demo", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_failure_is_500() {
    let (app, temp) = setup().await;

    let (status, _) = make_request(&app, Method::GET, "/api/components", None).await;
    assert_eq!(status, StatusCode::OK);

    // Known to the registry, but the file is already gone
    tokio::fs::remove_file(temp.path().join("shared/components/demo.html"))
        .await
        .unwrap();

    let (status, body) = make_request(&app, Method::DELETE, "/api/components/demo", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.unwrap()["error"].as_str().unwrap().contains("demo"));

    let (status, _) = make_request(&app, Method::GET, "/api/components/demo", None).await;
    assert_eq!(status, StatusCode::OK);
}
