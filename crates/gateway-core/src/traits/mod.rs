//! Core traits defined in `gateway-core` and implemented by other crates.

pub mod cache;
pub mod processing;

pub use cache::CacheProvider;
pub use processing::ProcessingClient;
