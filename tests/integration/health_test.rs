//! Health checks, the service root, and unknown routes.

use std::sync::atomic::Ordering;

use http::StatusCode;

use crate::helpers::{ALICE, TestApp};

#[tokio::test]
async fn test_root_describes_the_service() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["service"], "Imaging Gateway");
    assert_eq!(response.body["status"], "running");
    assert_eq!(response.body["endpoints"]["dicom"], "/api/dicom");
}

#[tokio::test]
async fn test_health_and_liveness() {
    let app = TestApp::new().await;

    let health = app.request("GET", "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");
    assert!(health.body["uptime"].is_number());

    let live = app.request("GET", "/health/live", None, None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body["status"], "alive");
}

#[tokio::test]
async fn test_ready_when_store_answers() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/health/ready", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_detailed_health_reports_each_component() {
    let app = TestApp::new().await;

    let healthy = app.request("GET", "/health/detailed", None, None).await;
    assert_eq!(healthy.status, StatusCode::OK);
    assert_eq!(healthy.body["components"]["store"]["status"], "connected");
    assert_eq!(healthy.body["components"]["store"]["provider"], "memory");
    assert_eq!(
        healthy.body["components"]["processingService"]["status"],
        "healthy"
    );

    app.upstream.unhealthy.store(true, Ordering::SeqCst);
    let degraded = app.request("GET", "/health/detailed", None, None).await;
    assert_eq!(degraded.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(degraded.body["status"], "unhealthy");
    assert_eq!(
        degraded.body["components"]["processingService"]["status"],
        "error"
    );
}

#[tokio::test]
async fn test_metrics_include_forward_count() {
    let app = TestApp::new().await;
    app.upload_as(ALICE, 1).await;

    let response = app.request("GET", "/health/metrics", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["forwards"]["inFlight"], 0);
    assert_eq!(
        response.body["components"]["processingService"]["jobs_processed"],
        42
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/nothing-here", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Not Found");
    assert_eq!(response.body["message"], "Route /api/nothing-here not found");
}
