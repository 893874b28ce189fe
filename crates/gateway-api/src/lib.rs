//! # gateway-api
//!
//! HTTP API layer for the imaging gateway built on Axum.
//!
//! Provides the DICOM upload and job management endpoints, health checks,
//! middleware (request logging, CORS, error diagnostics), the `AuthUser`
//! extractor, and the mapping from `AppError` to HTTP responses.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
