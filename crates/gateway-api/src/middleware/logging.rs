//! Request/response logging middleware.

use std::time::Instant;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info, warn};

use crate::error::ErrorReport;
use crate::state::AppState;

/// Largest JSON request body kept for failure logs.
const MAX_LOGGED_BODY: usize = 16 * 1024;

/// Logs method, path, status, duration and caller of every request.
///
/// The caller is resolved on a best-effort basis and never rejects the
/// request. Server errors additionally log the error report and, for
/// non-GET JSON requests, the request body.
pub async fn request_logging(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let caller = state.authenticator.authenticate_optional(
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    );
    let user_id = caller
        .as_ref()
        .map(|u| u.identity.id.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let (request, body_excerpt) = capture_json_body(request).await;
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        let report = response.extensions().get::<ErrorReport>();
        error!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            user_id = %user_id,
            code = report.map(|r| r.kind.code()).unwrap_or("UNKNOWN"),
            error = report.map(|r| r.message.as_str()).unwrap_or(""),
            chain = ?report.map(|r| r.chain.clone()).unwrap_or_default(),
            body = body_excerpt.as_deref().unwrap_or(""),
            "Request failed"
        );
    } else if response.status().is_client_error() {
        warn!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            user_id = %user_id,
            "Request rejected"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            user_id = %user_id,
            "HTTP request"
        );
    }

    response
}

/// Buffer small non-GET JSON bodies so they can be logged on failure.
async fn capture_json_body(request: Request) -> (Request, Option<String>) {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let small = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len <= MAX_LOGGED_BODY);

    if request.method() == Method::GET || !is_json || !small {
        return (request, None);
    }

    let (parts, body) = request.into_parts();
    match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(bytes) => {
            let excerpt = String::from_utf8_lossy(&bytes).into_owned();
            (Request::from_parts(parts, Body::from(bytes)), Some(excerpt))
        }
        Err(_) => (Request::from_parts(parts, Body::empty()), None),
    }
}
