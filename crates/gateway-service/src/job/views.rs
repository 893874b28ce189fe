//! Aggregated job views returned by listing operations.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use gateway_core::types::processing::RemoteActiveJobs;
use gateway_entity::job::{JobRecord, JobStatus};

/// A page of the caller's jobs, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    pub jobs: Vec<JobRecord>,
    /// Number of jobs in this page.
    pub count: usize,
    /// Number of jobs visible to the caller before truncation.
    pub total: usize,
}

/// Jobs currently in flight, locally and on the processing service.
#[derive(Debug, Clone)]
pub struct ActiveJobs {
    /// Local records in `processing` or `pending`.
    pub local: Vec<JobRecord>,
    /// The processing service's own view; `None` when it could not be reached.
    pub remote: Option<RemoteActiveJobs>,
}

impl ActiveJobs {
    /// Local and remote entries as one JSON list.
    pub fn entries(&self) -> Vec<Value> {
        let mut entries: Vec<Value> = self
            .local
            .iter()
            .filter_map(|job| serde_json::to_value(job).ok())
            .collect();
        if let Some(remote) = &self.remote {
            entries.extend(remote.processing.iter().cloned());
            entries.extend(remote.pending.iter().cloned());
        }
        entries
    }
}

/// Per-status job counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub processing: usize,
    #[serde(rename = "byStatus")]
    pub by_status: BTreeMap<String, usize>,
}

impl JobCounts {
    /// Count `jobs` by status.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a JobRecord>) -> Self {
        let mut counts = Self::default();
        for job in jobs {
            counts.total += 1;
            match job.status {
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Processing => counts.processing += 1,
                _ => {}
            }
            *counts
                .by_status
                .entry(job.status.as_str().to_string())
                .or_default() += 1;
        }
        counts
    }
}

/// Job statistics for the caller, plus processing metrics for administrators.
#[derive(Debug, Clone)]
pub struct JobStats {
    pub counts: JobCounts,
    /// `None` for non-administrators or when the service could not be reached.
    pub remote_metrics: Option<Value>,
}
