//! Job record persistence on top of the cache provider.
//!
//! Each job is one JSON document under `job:{id}` with a TTL that is reset
//! on every write. Writes replace the whole record (last writer wins).
//! Two secondary indexes are maintained next to the records: the set of a
//! user's job ids and the set of all job ids. Index members whose record
//! has expired are pruned lazily when the index is read.

use std::time::Duration;

use tracing::{debug, info, warn};

use gateway_core::error::ErrorKind;
use gateway_core::result::AppResult;
use gateway_core::traits::cache::CacheProvider;
use gateway_entity::job::JobRecord;

use crate::keys;
use crate::provider::CacheManager;

/// Persistent store of job records.
#[derive(Debug, Clone)]
pub struct JobStore {
    cache: CacheManager,
    ttl: Duration,
}

impl JobStore {
    /// Create a store whose records live for `ttl_seconds` after each write.
    pub fn new(cache: CacheManager, ttl_seconds: u64) -> Self {
        Self {
            cache,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Retention applied to each write.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Write the full record and refresh its index memberships.
    pub async fn put(&self, record: &JobRecord) -> AppResult<()> {
        self.cache
            .set_json(&keys::job(&record.job_id), record, self.ttl)
            .await?;
        self.cache
            .set_add(&keys::owner_jobs(&record.owner_id), &record.job_id, self.ttl)
            .await?;
        self.cache
            .set_add(keys::ALL_JOBS, &record.job_id, self.ttl)
            .await?;
        debug!(job_id = %record.job_id, status = %record.status, "Stored job record");
        Ok(())
    }

    /// Read a record. `None` when it never existed or has expired.
    pub async fn get(&self, job_id: &str) -> AppResult<Option<JobRecord>> {
        self.cache.get_json(&keys::job(job_id)).await
    }

    /// Jobs uploaded by `owner_id`.
    pub async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<JobRecord>> {
        self.load_index(&keys::owner_jobs(owner_id)).await
    }

    /// Every tracked job.
    pub async fn list_all(&self) -> AppResult<Vec<JobRecord>> {
        self.load_index(keys::ALL_JOBS).await
    }

    /// Every record found by a full key scan, bypassing the indexes.
    pub async fn scan_all(&self) -> AppResult<Vec<JobRecord>> {
        let keys = self.cache.scan_prefix(keys::JOB_PREFIX).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(job_id) = keys::job_id_from_key(&key) else {
                continue;
            };
            if let Some(record) = self.get_lenient(job_id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Re-derive both indexes from a full scan. Returns the number of records
    /// indexed.
    pub async fn rebuild_indexes(&self) -> AppResult<usize> {
        let records = self.scan_all().await?;
        for record in &records {
            self.cache
                .set_add(&keys::owner_jobs(&record.owner_id), &record.job_id, self.ttl)
                .await?;
            self.cache
                .set_add(keys::ALL_JOBS, &record.job_id, self.ttl)
                .await?;
        }
        info!(count = records.len(), "Rebuilt job indexes");
        Ok(records.len())
    }

    /// Check that the backend is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.cache.health_check().await
    }

    /// Name of the backing provider.
    pub fn provider_name(&self) -> &'static str {
        self.cache.provider_name()
    }

    async fn load_index(&self, index_key: &str) -> AppResult<Vec<JobRecord>> {
        let ids = self.cache.set_members(index_key).await?;
        let mut records = Vec::with_capacity(ids.len());
        let mut stale = Vec::new();

        for id in ids {
            match self.get_lenient(&id).await? {
                Some(record) => records.push(record),
                None => stale.push(id),
            }
        }

        if !stale.is_empty() {
            debug!(index = index_key, count = stale.len(), "Pruning expired index members");
            if let Err(e) = self.cache.set_remove(index_key, &stale).await {
                warn!(index = index_key, error = %e, "Failed to prune job index");
            }
        }

        Ok(records)
    }

    /// Like [`get`](Self::get), but treats an undecodable record as absent
    /// so one corrupt entry cannot break a listing.
    async fn get_lenient(&self, job_id: &str) -> AppResult<Option<JobRecord>> {
        match self.get(job_id).await {
            Err(e) if e.kind == ErrorKind::Serialization => {
                warn!(job_id, error = %e, "Skipping undecodable job record");
                Ok(None)
            }
            other => other,
        }
    }
}
