//! # gateway-cache
//!
//! Key-value backends for the imaging gateway and the job store built on
//! top of them. Supports two providers:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration.

pub mod jobs;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use jobs::JobStore;
pub use provider::CacheManager;
