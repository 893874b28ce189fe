//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use gateway_core::config::cache::CacheConfig;
use gateway_core::error::AppError;
use gateway_core::result::AppResult;
use gateway_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
    /// Name of the selected provider, reported by health endpoints.
    name: &'static str,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let (inner, name): (Arc<dyn CacheProvider>, &'static str) = match config.provider.as_str()
        {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                (Arc::new(crate::redis::RedisCacheProvider::new(client)), "redis")
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                let provider = crate::memory::MemoryCacheProvider::new(&config.memory);
                (Arc::new(provider), "memory")
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner, name })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self {
            inner: provider,
            name: "custom",
        }
    }

    /// Name of the selected provider.
    pub fn provider_name(&self) -> &'static str {
        self.name
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.scan_prefix(prefix).await
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set_add(key, member, ttl).await
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        self.inner.set_members(key).await
    }

    async fn set_remove(&self, key: &str, members: &[String]) -> AppResult<()> {
        self.inner.set_remove(key, members).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
