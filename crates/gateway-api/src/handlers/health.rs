//! Health check, root, and fallback handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use gateway_core::error::{AppError, ErrorKind};

use crate::dto::response::{
    ComponentHealth, DetailedHealthResponse, ForwardMetrics, HealthResponse, MetricsResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

const SERVICE_NAME: &str = "Imaging Gateway";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": VERSION,
        "status": "running",
        "endpoints": {
            "dicom": "/api/dicom",
            "jobs": "/api/jobs",
            "health": "/health",
        }
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
        timestamp: Utc::now(),
        uptime: state.uptime_seconds(),
    })
}

/// GET /health/detailed
///
/// 503 when the store or the processing service is unhealthy.
pub async fn detailed_health(
    State(state): State<AppState>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let mut components = BTreeMap::new();
    components.insert("store".to_string(), store_health(&state).await);
    components.insert(
        "processingService".to_string(),
        upstream_health(&state).await,
    );

    let healthy = components.values().all(ComponentHealth::is_healthy);
    let (code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        Json(DetailedHealthResponse {
            status: status.to_string(),
            service: SERVICE_NAME.to_string(),
            version: VERSION.to_string(),
            timestamp: Utc::now(),
            uptime: state.uptime_seconds(),
            components,
        }),
    )
}

/// GET /health/ready
///
/// Ready once the job store answers.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.health_check().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "timestamp": Utc::now()})),
        ),
        Ok(false) => not_ready("Job store unavailable".to_string()),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            not_ready(e.message)
        }
    }
}

fn not_ready(reason: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "not ready",
            "reason": reason,
            "timestamp": Utc::now(),
        })),
    )
}

/// GET /health/live
pub async fn liveness() -> Json<Value> {
    Json(json!({"status": "alive", "timestamp": Utc::now()}))
}

/// GET /health/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut components = BTreeMap::new();

    let store = store_health(&state).await;
    components.insert(
        "store".to_string(),
        serde_json::to_value(&store).unwrap_or(Value::Null),
    );

    let processing = match state.upstream.metrics().await {
        Ok(metrics) => metrics,
        Err(e) => json!({"error": e.to_string()}),
    };
    components.insert("processingService".to_string(), processing);

    let failed_jobs = match state.upstream.failed_jobs().await {
        Ok(failed) => serde_json::to_value(failed).unwrap_or(Value::Null),
        Err(e) => json!({"error": e.to_string()}),
    };

    Json(MetricsResponse {
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
        uptime: state.uptime_seconds(),
        components,
        failed_jobs,
        forwards: ForwardMetrics {
            in_flight: state.jobs.in_flight(),
        },
    })
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    AppError::new(ErrorKind::NotFound, format!("Route {uri} not found"))
        .titled("Not Found")
        .into()
}

async fn store_health(state: &AppState) -> ComponentHealth {
    let provider = Some(state.store.provider_name().to_string());
    match state.store.health_check().await {
        Ok(true) => ComponentHealth {
            status: "connected".to_string(),
            provider,
            details: None,
            error: None,
            last_checked: Utc::now(),
        },
        Ok(false) => ComponentHealth {
            status: "error".to_string(),
            provider,
            details: None,
            error: Some("store did not answer".to_string()),
            last_checked: Utc::now(),
        },
        Err(e) => ComponentHealth {
            status: "error".to_string(),
            provider,
            details: None,
            error: Some(e.message),
            last_checked: Utc::now(),
        },
    }
}

async fn upstream_health(state: &AppState) -> ComponentHealth {
    match state.upstream.health().await {
        Ok(details) => ComponentHealth {
            status: "healthy".to_string(),
            provider: None,
            details: Some(details),
            error: None,
            last_checked: Utc::now(),
        },
        Err(e) => ComponentHealth {
            status: "error".to_string(),
            provider: None,
            details: None,
            error: Some(e.to_string()),
            last_checked: Utc::now(),
        },
    }
}
