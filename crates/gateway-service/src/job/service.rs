//! Job lifecycle service.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gateway_cache::JobStore;
use gateway_core::config::AppConfig;
use gateway_core::error::{AppError, ErrorKind};
use gateway_core::result::AppResult;
use gateway_core::traits::processing::ProcessingClient;
use gateway_core::types::processing::{RemoteJobStatus, UploadFile};
use gateway_entity::job::{JobRecord, JobStatus};

use super::forwarder::{ForwardOutcome, Forwarder};
use super::intake::UploadPolicy;
use super::views::{ActiveJobs, JobCounts, JobListing, JobStats};
use crate::context::RequestContext;

/// Progress reported to the uploader in the intake response.
pub const INTAKE_PROGRESS: u8 = 10;

/// Result of a successful upload intake.
#[derive(Debug)]
pub struct IntakeReceipt {
    /// The record as persisted before the response.
    pub record: JobRecord,
    /// Processing time estimate for the uploader.
    pub estimated_time: String,
    /// Handle of the background forward.
    pub forward: JoinHandle<AppResult<ForwardOutcome>>,
}

/// Orchestrates job intake, reconciliation, cancellation, and retry.
///
/// Records are read and written without locking: every mutation re-reads
/// the current record and writes a full merged copy, so concurrent writers
/// to the same job resolve as last-writer-wins.
#[derive(Clone)]
pub struct JobService {
    store: JobStore,
    upstream: Arc<dyn ProcessingClient>,
    policy: UploadPolicy,
    forwarder: Forwarder,
    list_limit: usize,
}

impl std::fmt::Debug for JobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobService")
            .field("policy", &self.policy)
            .field("list_limit", &self.list_limit)
            .finish()
    }
}

impl JobService {
    /// Creates a new job service.
    pub fn new(store: JobStore, upstream: Arc<dyn ProcessingClient>, config: &AppConfig) -> Self {
        Self {
            forwarder: Forwarder::new(store.clone(), Arc::clone(&upstream)),
            store,
            upstream,
            policy: UploadPolicy::new(&config.uploads),
            list_limit: config.jobs.list_limit,
        }
    }

    /// Validate an upload, persist a new `uploading` record, and start the
    /// hand-off in the background.
    ///
    /// Returns as soon as the record is stored; the caller learns the
    /// forward's outcome by polling.
    pub async fn intake(
        &self,
        ctx: &RequestContext,
        files: Vec<UploadFile>,
    ) -> AppResult<IntakeReceipt> {
        self.policy.validate(&files)?;

        let file_names = files.iter().map(|f| f.file_name.clone()).collect();
        let record = JobRecord::new(ctx.user_id(), file_names);
        self.store.put(&record).await?;

        info!(
            job_id = %record.job_id,
            user_id = %ctx.user_id(),
            file_count = record.file_count,
            "Upload accepted"
        );

        let forward = self
            .forwarder
            .spawn(record.job_id.clone(), files, ctx.bearer_token.clone());

        Ok(IntakeReceipt {
            estimated_time: self.policy.estimated_time(record.file_count),
            record,
            forward,
        })
    }

    /// The job's current state, refreshed from the processing service.
    ///
    /// Failure to reach the processing service is not an error: the last
    /// locally known state is returned instead.
    pub async fn get_status(&self, ctx: &RequestContext, job_id: &str) -> AppResult<JobRecord> {
        let record = self.load_authorized(ctx, job_id).await?;

        let Some(remote_job_id) = record.remote_job_id.clone() else {
            return Ok(record);
        };
        if !record.status.is_active() {
            return Ok(record);
        }

        let remote = match self.upstream.get_status(&remote_job_id).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(
                    job_id,
                    remote_job_id = %remote_job_id,
                    error = %e,
                    "Status reconciliation failed; returning last known state"
                );
                return Ok(record);
            }
        };
        let patch = self.remote_patch(&record, &remote_job_id, remote).await;

        // the record may have been cancelled or re-forwarded during the call
        let mut current = self.reload(record).await?;
        if !current.status.is_active()
            || current.remote_job_id.as_deref() != Some(remote_job_id.as_str())
        {
            debug!(job_id, status = %current.status, "Job changed during reconciliation; keeping it");
            return Ok(current);
        }

        if patch.apply(&mut current) {
            if let Err(e) = self.store.put(&current).await {
                warn!(job_id, error = %e, "Failed to persist reconciled job state");
            }
        }
        Ok(current)
    }

    /// The stored record, without contacting the processing service.
    pub async fn get_job(&self, ctx: &RequestContext, job_id: &str) -> AppResult<JobRecord> {
        self.load_authorized(ctx, job_id).await
    }

    /// Result payload of a completed job, fetched once from the processing
    /// service when not yet stored.
    pub async fn get_results(&self, ctx: &RequestContext, job_id: &str) -> AppResult<Value> {
        let record = self.load_authorized(ctx, job_id).await?;

        if record.status != JobStatus::Completed {
            return Err(AppError::invalid_state(format!(
                "Job status is {}. Results are not yet available.",
                record.status
            ))
            .titled("Job not completed")
            .with_context("status", record.status.as_str()));
        }

        if let Some(result) = record.result.clone() {
            return Ok(result);
        }

        let Some(remote_job_id) = record.remote_job_id.clone() else {
            return Err(AppError::results_unavailable(
                "No results were recorded for this job",
            ));
        };

        let result = self
            .upstream
            .get_results(&remote_job_id)
            .await
            .map_err(|e| {
                warn!(job_id, remote_job_id = %remote_job_id, error = %e, "Failed to fetch results");
                AppError::with_source(
                    ErrorKind::ResultsUnavailable,
                    "Failed to retrieve processing results",
                    e,
                )
            })?;

        let mut current = self.reload(record).await?;
        if current.status == JobStatus::Completed && current.result.is_none() {
            current.result = Some(result.clone());
            current.touch();
            if let Err(e) = self.store.put(&current).await {
                warn!(job_id, error = %e, "Failed to persist fetched results");
            }
        }
        Ok(result)
    }

    /// Cancel a job. Local cancellation always wins; the remote cancel is
    /// best-effort. Cancelling a cancelled job is a no-op.
    pub async fn cancel(&self, ctx: &RequestContext, job_id: &str) -> AppResult<JobRecord> {
        let record = self.load_authorized(ctx, job_id).await?;

        match record.status {
            JobStatus::Cancelled => return Ok(record),
            JobStatus::Completed | JobStatus::Failed => {
                return Err(AppError::invalid_state(format!(
                    "Job status is {}. Only pending or processing jobs can be cancelled.",
                    record.status
                ))
                .titled("Job cannot be cancelled")
                .with_context("status", record.status.as_str()));
            }
            JobStatus::Uploading | JobStatus::Pending | JobStatus::Processing => {}
        }

        if let Some(remote_job_id) = &record.remote_job_id {
            if let Err(e) = self.upstream.cancel(remote_job_id).await {
                warn!(job_id, remote_job_id = %remote_job_id, error = %e, "Remote cancel failed");
            }
        }

        let mut current = self.reload(record).await?;
        current.cancel();
        self.store.put(&current).await?;
        info!(job_id, user_id = %ctx.user_id(), "Job cancelled");
        Ok(current)
    }

    /// Put a failed job back in the queue. The remote retry is best-effort.
    pub async fn retry(&self, ctx: &RequestContext, job_id: &str) -> AppResult<JobRecord> {
        let record = self.load_authorized(ctx, job_id).await?;

        if !record.status.can_retry() {
            return Err(AppError::invalid_state(format!(
                "Job status is {}. Only failed jobs can be retried.",
                record.status
            ))
            .titled("Job cannot be retried")
            .with_context("status", record.status.as_str()));
        }

        if let Some(remote_job_id) = &record.remote_job_id {
            if let Err(e) = self.upstream.retry(remote_job_id).await {
                warn!(job_id, remote_job_id = %remote_job_id, error = %e, "Remote retry failed");
            }
        }

        let mut current = self.reload(record).await?;
        current.reset_for_retry();
        self.store.put(&current).await?;
        info!(job_id, user_id = %ctx.user_id(), "Job retry initiated");
        Ok(current)
    }

    /// The caller's jobs, newest first, truncated to the listing limit.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<JobListing> {
        let mut jobs = self.store.list_for_owner(ctx.user_id()).await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = jobs.len();
        jobs.truncate(self.list_limit);
        Ok(JobListing {
            count: jobs.len(),
            total,
            jobs,
        })
    }

    /// Jobs in flight across all users. Callers must check the admin role.
    pub async fn active(&self) -> AppResult<ActiveJobs> {
        let mut local: Vec<JobRecord> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|job| matches!(job.status, JobStatus::Processing | JobStatus::Pending))
            .collect();
        local.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let remote = match self.upstream.active_jobs().await {
            Ok(remote) => Some(remote),
            Err(e) => {
                warn!(error = %e, "Failed to fetch active jobs from processing service");
                None
            }
        };

        Ok(ActiveJobs { local, remote })
    }

    /// Job counts for the caller, or for everyone when the caller is an
    /// administrator. Administrators also receive processing metrics.
    pub async fn stats(&self, ctx: &RequestContext) -> AppResult<JobStats> {
        let jobs = if ctx.is_admin() {
            self.store.list_all().await?
        } else {
            self.store.list_for_owner(ctx.user_id()).await?
        };
        let counts = JobCounts::tally(&jobs);

        let remote_metrics = if ctx.is_admin() {
            match self.upstream.metrics().await {
                Ok(metrics) => Some(metrics),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch processing metrics");
                    None
                }
            }
        } else {
            None
        };

        Ok(JobStats {
            counts,
            remote_metrics,
        })
    }

    /// Number of background forwards still running.
    pub fn in_flight(&self) -> usize {
        self.forwarder.in_flight()
    }

    /// Wait up to `grace` for background forwards to finish.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.forwarder.drain(grace).await
    }

    /// Load a record and check that the caller may see it.
    async fn load_authorized(&self, ctx: &RequestContext, job_id: &str) -> AppResult<JobRecord> {
        let record = self.store.get(job_id).await?.ok_or_else(|| {
            AppError::not_found(format!("No job found with ID {job_id}"))
        })?;

        if !ctx.is_admin() && !record.is_owned_by(ctx.user_id()) {
            debug!(job_id, user_id = %ctx.user_id(), "Denied access to another user's job");
            return Err(
                AppError::forbidden("You do not have permission to view this job")
                    .titled("Access denied"),
            );
        }

        Ok(record)
    }

    /// Re-read `record` right before patching it; falls back to the given
    /// copy if it expired in the meantime.
    async fn reload(&self, record: JobRecord) -> AppResult<JobRecord> {
        Ok(self.store.get(&record.job_id).await?.unwrap_or(record))
    }

    /// Translate an upstream status report into a patch for `record`,
    /// fetching results when the job has just completed.
    async fn remote_patch(
        &self,
        record: &JobRecord,
        remote_job_id: &str,
        remote: RemoteJobStatus,
    ) -> RemotePatch {
        let status = JobStatus::from_remote(&remote.status);
        if status.is_none() {
            debug!(
                job_id = %record.job_id,
                remote_status = %remote.status,
                "Ignoring unknown remote status"
            );
        }
        let progress = remote
            .progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0).round() as u8);

        let mut result = remote.result;
        if status == Some(JobStatus::Completed) && result.is_none() && record.result.is_none() {
            match self.upstream.get_results(remote_job_id).await {
                Ok(fetched) => result = Some(fetched),
                Err(e) => warn!(
                    job_id = %record.job_id,
                    error = %e,
                    "Job completed but results could not be fetched yet"
                ),
            }
        }

        let error = if status == Some(JobStatus::Failed) {
            remote.error
        } else {
            None
        };

        RemotePatch {
            status,
            progress,
            result,
            error,
        }
    }
}

/// Fields taken from one upstream status report.
#[derive(Debug)]
struct RemotePatch {
    status: Option<JobStatus>,
    progress: Option<u8>,
    result: Option<Value>,
    error: Option<String>,
}

impl RemotePatch {
    /// Returns whether the record changed.
    fn apply(self, record: &mut JobRecord) -> bool {
        record.apply_remote(self.status, self.progress, self.result, self.error)
    }
}
