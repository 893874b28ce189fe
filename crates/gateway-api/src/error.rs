//! Maps domain `AppError` to HTTP responses.

use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Map, Value};

use gateway_auth::AuthError;
use gateway_core::error::{AppError, ErrorKind};

/// Message shown in place of internal error detail.
const GENERIC_MESSAGE: &str = "An unexpected error occurred";

/// Handler-facing error type. Wraps [`AppError`] so it can be rendered.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

/// Diagnostic copy of a rendered error, attached to the response
/// extensions for the logging and diagnostics middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    /// The unredacted message.
    pub message: String,
    /// Messages of the source chain.
    pub chain: Vec<String>,
    /// The JSON body as sent.
    pub body: Map<String, Value>,
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
        ErrorKind::AuthRequired
        | ErrorKind::MalformedToken
        | ErrorKind::TokenExpired
        | ErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StoreUnavailable
        | ErrorKind::ClientNotInitialized
        | ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::UpstreamInternal | ErrorKind::UpstreamRejected | ErrorKind::UpstreamNotFound => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::ResultsUnavailable
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        let message = if err.kind.is_internal() {
            tracing::error!(code = err.kind.code(), error = %err.message, "Internal server error");
            GENERIC_MESSAGE.to_string()
        } else {
            err.message.clone()
        };

        let mut body = Map::new();
        body.insert("error".into(), Value::from(err.title()));
        body.insert("code".into(), Value::from(err.kind.code()));
        body.insert("message".into(), Value::from(message));
        body.insert("timestamp".into(), Value::from(Utc::now().to_rfc3339()));
        for (key, value) in &err.context {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let report = ErrorReport {
            kind: err.kind,
            message: err.message.clone(),
            chain: err.chain(),
            body: body.clone(),
        };

        let mut response = (status, Json(Value::Object(body))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Renders a handler panic as a 500 error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    ApiError(AppError::internal(format!("Handler panicked: {detail}"))).into_response()
}
