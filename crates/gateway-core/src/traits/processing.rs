//! Seam between the job orchestrator and the remote processing service.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::types::processing::{
    RemoteActiveJobs, RemoteFailedJobs, RemoteJobStatus, SubmitReceipt, Submission,
};

/// Operations offered by the upstream processing service.
///
/// Each method maps to exactly one remote endpoint. Implementations must
/// fail with [`UpstreamError::NotInitialized`] when used before they are
/// configured.
#[async_trait]
pub trait ProcessingClient: Send + Sync + 'static {
    /// Forward uploaded files for processing.
    async fn submit(&self, submission: Submission) -> Result<SubmitReceipt, UpstreamError>;

    /// Current status of a remote job.
    async fn get_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, UpstreamError>;

    /// Result payload of a completed remote job.
    async fn get_results(&self, remote_job_id: &str) -> Result<Value, UpstreamError>;

    /// Ask the service to stop a remote job.
    async fn cancel(&self, remote_job_id: &str) -> Result<(), UpstreamError>;

    /// Ask the service to run a failed remote job again.
    async fn retry(&self, remote_job_id: &str) -> Result<(), UpstreamError>;

    /// Jobs the service is currently working on.
    async fn active_jobs(&self) -> Result<RemoteActiveJobs, UpstreamError>;

    /// Jobs the service reports as failed.
    async fn failed_jobs(&self) -> Result<RemoteFailedJobs, UpstreamError>;

    /// The service's own health report.
    async fn health(&self) -> Result<Value, UpstreamError>;

    /// The service's processing metrics.
    async fn metrics(&self) -> Result<Value, UpstreamError>;
}
