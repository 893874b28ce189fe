//! Axum middleware stack.

pub mod cors;
pub mod errors;
pub mod logging;
pub mod rbac;
