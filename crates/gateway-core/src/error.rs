//! Unified application error types for the gateway.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The upstream processing client has
//! its own closed taxonomy, [`UpstreamError`], which converts losslessly
//! into an [`ErrorKind`].

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input validation failed. No side effects were performed.
    Validation,
    /// No `Authorization` header was supplied.
    AuthRequired,
    /// The `Authorization` header did not use the bearer scheme.
    MalformedToken,
    /// The bearer token was well-formed but has expired.
    TokenExpired,
    /// The bearer token failed signature or claim verification.
    InvalidToken,
    /// The caller does not have permission to perform the action.
    Forbidden,
    /// The requested job does not exist (or has expired).
    NotFound,
    /// The operation is not valid for the job's current status.
    InvalidState,
    /// The job store could not be reached.
    StoreUnavailable,
    /// The upstream client was used before it was initialized.
    ClientNotInitialized,
    /// The upstream processing service is unavailable.
    UpstreamUnavailable,
    /// The upstream processing service did not answer in time.
    UpstreamTimeout,
    /// The upstream processing service failed with a 5xx status.
    UpstreamInternal,
    /// The upstream processing service does not know the resource.
    UpstreamNotFound,
    /// The upstream processing service rejected the request (4xx).
    UpstreamRejected,
    /// Results could not be obtained for a completed job.
    ResultsUnavailable,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code exposed in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::ClientNotInitialized => "CLIENT_NOT_INITIALIZED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::UpstreamInternal => "UPSTREAM_INTERNAL_ERROR",
            Self::UpstreamNotFound => "UPSTREAM_NOT_FOUND",
            Self::UpstreamRejected => "UPSTREAM_REJECTED",
            Self::ResultsUnavailable => "RESULTS_UNAVAILABLE",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Short human-readable title used as the `error` field of a response
    /// when the error does not carry its own.
    pub fn default_title(&self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::AuthRequired => "Access denied",
            Self::MalformedToken => "Invalid token format",
            Self::TokenExpired => "Token expired",
            Self::InvalidToken => "Invalid token",
            Self::Forbidden => "Insufficient permissions",
            Self::NotFound => "Job not found",
            Self::InvalidState => "Invalid job state",
            Self::StoreUnavailable => "Service unavailable",
            Self::ClientNotInitialized => "Processing service unavailable",
            Self::UpstreamUnavailable => "Processing service unavailable",
            Self::UpstreamTimeout => "Processing service timeout",
            Self::UpstreamInternal => "Processing service error",
            Self::UpstreamNotFound => "Remote job not found",
            Self::UpstreamRejected => "Processing service rejected request",
            Self::ResultsUnavailable => "Results unavailable",
            Self::Configuration | Self::Serialization | Self::Internal => "Internal server error",
        }
    }

    /// Whether the message of this kind may contain internal details and
    /// must be replaced by a generic sentence before reaching a client.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Configuration | Self::Serialization | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout the gateway.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional short title overriding [`ErrorKind::default_title`].
    pub title: Option<String>,
    /// Structured fields merged into the error response body.
    pub context: Map<String, Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            title: None,
            context: Map::new(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(kind, message)
        }
    }

    /// Override the response title.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a structured context field to the response body.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// The response title: the explicit one, or the kind's default.
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.kind.default_title())
    }

    /// Messages of the source chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self
            .source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static));
        while let Some(err) = current {
            chain.push(err.to_string());
            current = err.source();
        }
        chain
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a missing-credentials error.
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthRequired, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create a store-unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Create a results-unavailable error.
    pub fn results_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResultsUnavailable, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            title: self.title.clone(),
            context: self.context.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Failure modes of the upstream processing client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// The client was invoked before `init` (or after `shutdown`).
    #[error("processing client is not initialized")]
    NotInitialized,
    /// HTTP 503 or a connection-level failure.
    #[error("processing service unavailable: {0}")]
    Unavailable(String),
    /// HTTP 504 or a client-side timeout.
    #[error("processing service timed out: {0}")]
    Timeout(String),
    /// Any other 5xx, or an unreadable response body.
    #[error("processing service error (HTTP {status}): {message}")]
    Internal { status: u16, message: String },
    /// HTTP 404.
    #[error("remote resource not found: {0}")]
    NotFound(String),
    /// Any other 4xx.
    #[error("processing service rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl UpstreamError {
    /// Classify a non-success HTTP status returned by the upstream service.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            503 => Self::Unavailable(message),
            504 => Self::Timeout(message),
            s if s >= 500 => Self::Internal { status: s, message },
            404 => Self::NotFound(message),
            s => Self::Rejected { status: s, message },
        }
    }

    /// The application error kind this failure maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::ClientNotInitialized,
            Self::Unavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::Timeout(_) => ErrorKind::UpstreamTimeout,
            Self::Internal { .. } => ErrorKind::UpstreamInternal,
            Self::NotFound(_) => ErrorKind::UpstreamNotFound,
            Self::Rejected { .. } => ErrorKind::UpstreamRejected,
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        let kind = err.kind();
        Self::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            UpstreamError::from_status(503, "down"),
            UpstreamError::Unavailable("down".into())
        );
        assert_eq!(UpstreamError::from_status(504, "slow").kind(), ErrorKind::UpstreamTimeout);
        assert_eq!(UpstreamError::from_status(500, "boom").kind(), ErrorKind::UpstreamInternal);
        assert_eq!(UpstreamError::from_status(502, "bad gw").kind(), ErrorKind::UpstreamInternal);
        assert_eq!(UpstreamError::from_status(404, "gone").kind(), ErrorKind::UpstreamNotFound);
        assert_eq!(UpstreamError::from_status(422, "bad").kind(), ErrorKind::UpstreamRejected);
    }

    #[test]
    fn test_upstream_error_converts_with_kind() {
        let err: AppError = UpstreamError::NotInitialized.into();
        assert_eq!(err.kind, ErrorKind::ClientNotInitialized);
        assert_eq!(err.chain(), vec!["processing client is not initialized".to_string()]);
    }

    #[test]
    fn test_title_and_context() {
        let err = AppError::validation("Maximum 10 files allowed")
            .titled("Too many files")
            .with_context("maxFiles", 10);
        assert_eq!(err.title(), "Too many files");
        assert_eq!(err.context["maxFiles"], 10);

        let plain = AppError::not_found("missing");
        assert_eq!(plain.title(), "Job not found");
    }

    #[test]
    fn test_internal_kinds_are_hidden() {
        assert!(ErrorKind::Internal.is_internal());
        assert!(ErrorKind::Serialization.is_internal());
        assert!(!ErrorKind::ResultsUnavailable.is_internal());
        assert!(!ErrorKind::Validation.is_internal());
    }
}
