//! Background hand-off of uploaded files to the processing service.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use gateway_cache::JobStore;
use gateway_core::result::AppResult;
use gateway_core::traits::processing::ProcessingClient;
use gateway_core::types::processing::{Submission, UploadFile};
use gateway_entity::job::JobStatus;

/// Summary stored on a job whose hand-off failed.
const FORWARD_FAILED: &str = "Failed to process files";

/// What a background forward did to the job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The processing service accepted the files.
    Forwarded { remote_job_id: String },
    /// The processing service could not be reached or rejected the files.
    Failed { error: String },
    /// The record expired before the outcome could be written.
    Discarded,
}

/// Runs forwards as tracked background tasks so shutdown can wait for them.
#[derive(Clone)]
pub struct Forwarder {
    store: JobStore,
    upstream: Arc<dyn ProcessingClient>,
    tracker: TaskTracker,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("in_flight", &self.tracker.len())
            .finish()
    }
}

impl Forwarder {
    pub fn new(store: JobStore, upstream: Arc<dyn ProcessingClient>) -> Self {
        Self {
            store,
            upstream,
            tracker: TaskTracker::new(),
        }
    }

    /// Start forwarding `files` for `job_id` without waiting for the result.
    ///
    /// The returned handle resolves once the outcome has been written to the
    /// store. Dropping it does not cancel the forward.
    pub fn spawn(
        &self,
        job_id: String,
        files: Vec<UploadFile>,
        bearer_token: Option<String>,
    ) -> JoinHandle<AppResult<ForwardOutcome>> {
        let this = self.clone();
        self.tracker.spawn(async move {
            let result = this.forward(&job_id, files, bearer_token).await;
            if let Err(e) = &result {
                error!(job_id = %job_id, error = %e, "Failed to record forward outcome");
            }
            result
        })
    }

    /// Number of forwards still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting new forwards and wait up to `grace` for running ones.
    ///
    /// Returns `true` when every forward finished in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight forwards");
        }
        let finished = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        if !finished {
            warn!(
                pending = self.tracker.len(),
                "Shutdown grace period elapsed with forwards still running"
            );
        }
        finished
    }

    async fn forward(
        &self,
        job_id: &str,
        files: Vec<UploadFile>,
        bearer_token: Option<String>,
    ) -> AppResult<ForwardOutcome> {
        let file_count = files.len();
        let submission = Submission {
            job_id: job_id.to_string(),
            files,
            bearer_token,
        };
        let result = self.upstream.submit(submission).await;

        // Re-read so writes made while the upload was in flight are kept.
        let Some(mut record) = self.store.get(job_id).await? else {
            warn!(job_id, "Job record expired before forward completed");
            return Ok(ForwardOutcome::Discarded);
        };

        let outcome = match result {
            Ok(receipt) => {
                info!(
                    job_id,
                    remote_job_id = %receipt.job_id,
                    file_count,
                    "Files forwarded to processing service"
                );
                if record.status == JobStatus::Cancelled {
                    // Cancelled while uploading: stop the remote job too.
                    if let Err(e) = self.upstream.cancel(&receipt.job_id).await {
                        warn!(job_id, error = %e, "Failed to cancel remote job of cancelled upload");
                    }
                }
                let remote_job_id = receipt.job_id.clone();
                record.mark_forwarded(receipt.job_id, receipt.estimated_time);
                ForwardOutcome::Forwarded { remote_job_id }
            }
            Err(e) => {
                error!(job_id, error = %e, "Failed to forward files to processing service");
                record.mark_forward_failed(FORWARD_FAILED, e.to_string());
                ForwardOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        self.store.put(&record).await?;
        Ok(outcome)
    }
}
