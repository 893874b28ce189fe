//! In-memory cache implementation using the moka crate.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use gateway_core::config::cache::MemoryCacheConfig;
use gateway_core::result::AppResult;
use gateway_core::traits::cache::CacheProvider;

/// A stored value together with the TTL it was written with.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after the TTL given at write time.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// A set value with its own expiry deadline.
#[derive(Debug)]
struct SetEntry {
    members: HashSet<String>,
    expires_at: Instant,
}

/// In-memory cache provider using moka for values and dashmap for sets.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, CacheEntry>,
    /// Sets stored separately since moka values are immutable.
    sets: Arc<DashMap<String, SetEntry>>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            sets: Arc::new(DashMap::new()),
        }
    }

    /// Drop the set at `key` if its deadline has passed.
    fn evict_expired_set(&self, key: &str) {
        self.sets
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry {
            value: Arc::from(value),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.sets.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        // Expired entries are skipped by the iterator.
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
            .collect();
        debug!(prefix, count = keys.len(), "Scanned keys by prefix");
        Ok(keys)
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        self.evict_expired_set(key);
        let mut entry = self.sets.entry(key.to_string()).or_insert_with(|| SetEntry {
            members: HashSet::new(),
            expires_at: Instant::now() + ttl,
        });
        entry.members.insert(member.to_string());
        entry.expires_at = Instant::now() + ttl;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        self.evict_expired_set(key);
        Ok(self
            .sets
            .get(key)
            .map(|entry| entry.members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_remove(&self, key: &str, members: &[String]) -> AppResult<()> {
        if let Some(mut entry) = self.sets.get_mut(key) {
            for member in members {
                entry.members.remove(member);
            }
        }
        self.sets.remove_if(key, |_, entry| entry.members.is_empty());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
