//! # gateway-core
//!
//! Core crate for the imaging gateway. Contains the error taxonomy,
//! configuration schemas, the seam traits implemented by the cache and
//! upstream crates, and the processing-service wire types.
//!
//! This crate has **no** internal dependencies on other gateway crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind, UpstreamError};
pub use result::AppResult;
