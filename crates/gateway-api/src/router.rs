//! Route definitions for the imaging gateway HTTP API.
//!
//! Job routes are mounted under `/api`, health checks under `/health`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::error::panic_response;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    let api_routes = Router::new().merge(dicom_routes()).merge(job_routes());

    Router::new()
        .route("/", get(handlers::health::root))
        .nest("/api", api_routes)
        .merge(health_routes())
        .fallback(handlers::health::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::errors::attach_error_stack,
        ))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors::build_cors_layer(&state.config.server.cors))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// DICOM upload and polling
fn dicom_routes() -> Router<AppState> {
    Router::new()
        .route("/dicom/upload", post(handlers::dicom::upload))
        .route(
            "/dicom/job/{job_id}/status",
            get(handlers::dicom::job_status),
        )
        .route(
            "/dicom/job/{job_id}/results",
            get(handlers::dicom::job_results),
        )
        .route(
            "/dicom/job/{job_id}",
            delete(handlers::dicom::cancel_job),
        )
}

/// Job listing and management
fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(handlers::jobs::list_jobs))
        .route("/jobs/active", get(handlers::jobs::active_jobs))
        .route("/jobs/stats", get(handlers::jobs::job_stats))
        .route(
            "/jobs/{job_id}",
            get(handlers::jobs::get_job).delete(handlers::jobs::cancel_job),
        )
        .route("/jobs/{job_id}/retry", post(handlers::jobs::retry_job))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::detailed_health))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/metrics", get(handlers::health::metrics))
}
