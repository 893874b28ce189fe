//! Development diagnostics for internal errors.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;

use crate::error::ErrorReport;
use crate::state::AppState;

/// In development, re-renders internal error responses with the real
/// message and the source chain under `stack`.
pub async fn attach_error_stack(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.server.is_development() {
        return response;
    }

    let Some(report) = response
        .extensions()
        .get::<ErrorReport>()
        .filter(|r| r.kind.is_internal())
        .cloned()
    else {
        return response;
    };

    let mut body = report.body;
    body.insert("message".into(), Value::from(report.message));
    body.insert(
        "stack".into(),
        Value::Array(report.chain.into_iter().map(Value::from).collect()),
    );

    let Ok(bytes) = serde_json::to_vec(&Value::Object(body)) else {
        return response;
    };
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
