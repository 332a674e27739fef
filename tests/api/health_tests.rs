//! Health Check API Tests

use axum::http::StatusCode;

use crate::common::{json_body, TestApp};

/// Test basic health check endpoint returns 200 OK
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::connected().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
}

/// Liveness does not depend on the broker
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::disconnected();

    let response = app.get("/health/live").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "alive");
}

#[tokio::test]
async fn test_readiness_probe_when_connected() {
    let app = TestApp::connected().await;

    let response = app.get("/health/ready").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["relay"]["status"], "healthy");
    assert_eq!(json["checks"]["relay"]["queue"], "chat.http");
    assert_eq!(json["checks"]["sessions"]["active"], 0);
}

#[tokio::test]
async fn test_readiness_probe_without_broker() {
    let app = TestApp::disconnected();

    let response = app.get("/health/ready").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["checks"]["relay"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::connected().await;

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("webchat_sessions_active"));
}
