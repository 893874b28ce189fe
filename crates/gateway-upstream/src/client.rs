//! Lifecycle wrapper around the processing service HTTP client.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use gateway_core::config::upstream::UpstreamConfig;
use gateway_core::error::{AppError, UpstreamError};
use gateway_core::traits::processing::ProcessingClient;
use gateway_core::types::processing::{
    RemoteActiveJobs, RemoteFailedJobs, RemoteJobStatus, SubmitReceipt, Submission,
};

use crate::http::HttpProcessingClient;

/// Process-wide handle to the processing service.
///
/// Constructed empty; [`init`](Self::init) binds it to a base URL and
/// [`shutdown`](Self::shutdown) releases it. Every operation issued while
/// unbound fails with [`UpstreamError::NotInitialized`].
#[derive(Debug, Default)]
pub struct UpstreamClient {
    inner: RwLock<Option<HttpProcessingClient>>,
}

impl UpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the client to the configured service.
    ///
    /// Performs one connectivity check against `/health`. A failed check is
    /// logged but does not fail initialization, since the processing service
    /// may come up after the gateway.
    pub async fn init(&self, config: &UpstreamConfig) -> Result<(), AppError> {
        let client = HttpProcessingClient::new(config)?;
        info!(base_url = %client.base_url(), "Initializing processing service client");

        match client.ping().await {
            Ok(()) => info!("Processing service is reachable"),
            Err(e) => warn!(error = %e, "Processing service is not reachable yet; continuing"),
        }

        *self.inner.write().await = Some(client);
        Ok(())
    }

    /// Release the client. Later calls fail with `NotInitialized`.
    pub async fn shutdown(&self) {
        if self.inner.write().await.take().is_some() {
            info!("Processing service client shut down");
        }
    }

    /// Whether [`init`](Self::init) has completed and no shutdown happened since.
    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Snapshot of the bound client. reqwest clients are cheap to clone, so
    /// the lock is not held across the network call.
    async fn client(&self) -> Result<HttpProcessingClient, UpstreamError> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or(UpstreamError::NotInitialized)
    }
}

#[async_trait]
impl ProcessingClient for UpstreamClient {
    async fn submit(&self, submission: Submission) -> Result<SubmitReceipt, UpstreamError> {
        self.client().await?.submit(submission).await
    }

    async fn get_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, UpstreamError> {
        self.client().await?.get_status(remote_job_id).await
    }

    async fn get_results(&self, remote_job_id: &str) -> Result<Value, UpstreamError> {
        self.client().await?.get_results(remote_job_id).await
    }

    async fn cancel(&self, remote_job_id: &str) -> Result<(), UpstreamError> {
        self.client().await?.cancel(remote_job_id).await
    }

    async fn retry(&self, remote_job_id: &str) -> Result<(), UpstreamError> {
        self.client().await?.retry(remote_job_id).await
    }

    async fn active_jobs(&self) -> Result<RemoteActiveJobs, UpstreamError> {
        self.client().await?.active_jobs().await
    }

    async fn failed_jobs(&self) -> Result<RemoteFailedJobs, UpstreamError> {
        self.client().await?.failed_jobs().await
    }

    async fn health(&self) -> Result<Value, UpstreamError> {
        self.client().await?.health().await
    }

    async fn metrics(&self) -> Result<Value, UpstreamError> {
        self.client().await?.metrics().await
    }
}
