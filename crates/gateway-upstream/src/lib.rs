//! # gateway-upstream
//!
//! Client for the remote processing service. [`UpstreamClient`] owns the
//! connection lifecycle (`init` / `shutdown`) and implements
//! [`ProcessingClient`](gateway_core::traits::ProcessingClient) by
//! delegating to the reqwest-based [`HttpProcessingClient`].

pub mod client;
pub mod http;

pub use client::UpstreamClient;
pub use http::HttpProcessingClient;
