//! reqwest implementation of the processing service endpoints.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use gateway_core::config::upstream::UpstreamConfig;
use gateway_core::error::{AppError, UpstreamError};
use gateway_core::types::processing::{
    RemoteActiveJobs, RemoteFailedJobs, RemoteJobStatus, SubmitReceipt, Submission,
};

/// MIME type sent for parts that arrived without one.
const DEFAULT_PART_MIME: &str = "application/dicom";

/// Longest error body excerpt carried into an [`UpstreamError`].
const MAX_ERROR_BODY: usize = 512;

/// A configured HTTP client bound to one processing service base URL.
#[derive(Debug, Clone)]
pub struct HttpProcessingClient {
    http: Client,
    base_url: String,
    base: Url,
    upload_timeout: Duration,
}

impl HttpProcessingClient {
    /// Build a client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::configuration(format!(
                "upstream.base_url must be an http(s) URL, got '{}'",
                config.base_url
            )));
        }
        let base = Url::parse(&base_url).map_err(|e| {
            AppError::configuration(format!("Invalid upstream.base_url '{}': {e}", config.base_url))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build upstream HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url,
            base,
            upload_timeout: Duration::from_secs(config.upload_timeout_seconds),
        })
    }

    /// The configured base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `{base}/api/v1/job/{id}[/{action}]` with the id percent-encoded as a
    /// single path segment.
    fn job_url(&self, remote_job_id: &str, action: Option<&str>) -> Result<String, UpstreamError> {
        if matches!(remote_job_id, "" | "." | "..") {
            return Err(UpstreamError::Rejected {
                status: 400,
                message: format!("invalid remote job id '{remote_job_id}'"),
            });
        }

        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| UpstreamError::Rejected {
                status: 400,
                message: format!("base URL '{}' cannot carry a path", self.base_url),
            })?;
            segments
                .pop_if_empty()
                .extend(["api", "v1", "job", remote_job_id]);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url.into())
    }

    /// Send a request and classify any failure.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, UpstreamError> {
        debug!(url, "Calling processing service");
        let response = request.send().await.map_err(|e| {
            let err = if e.is_timeout() {
                UpstreamError::Timeout(e.to_string())
            } else {
                UpstreamError::Unavailable(e.to_string())
            };
            error!(url, error = %err, "Processing service request failed");
            err
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = UpstreamError::from_status(status.as_u16(), error_message(&body, status.as_u16()));
        error!(url, status = status.as_u16(), error = %err, "Processing service returned an error");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| UpstreamError::Internal {
            status,
            message: format!("unreadable response body: {e}"),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        self.get_json_at(&self.url(path)).await
    }

    async fn get_json_at<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self.send(self.http.get(url), url).await?;
        Self::decode(response).await
    }

    /// `POST /api/v1/process-dicom` with the files as multipart `files`
    /// parts and the local job id as `job_id`.
    pub async fn submit(&self, submission: Submission) -> Result<SubmitReceipt, UpstreamError> {
        let url = self.url("/api/v1/process-dicom");
        let file_count = submission.files.len();

        let mut form = Form::new().text("job_id", submission.job_id.clone());
        for file in submission.files {
            let size = file.size();
            let mime = file.content_type.as_deref().unwrap_or(DEFAULT_PART_MIME);
            let part = Part::stream_with_length(Body::from(file.data), size)
                .file_name(file.file_name);
            let part = match part.mime_str(mime) {
                Ok(part) => part,
                Err(_) => {
                    return Err(UpstreamError::Rejected {
                        status: 400,
                        message: format!("invalid content type '{mime}'"),
                    });
                }
            };
            form = form.part("files", part);
        }

        let mut request = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.upload_timeout);
        if let Some(token) = &submission.bearer_token {
            request = request.bearer_auth(token);
        }

        debug!(job_id = %submission.job_id, file_count, "Submitting files for processing");
        let response = self.send(request, &url).await?;
        Self::decode(response).await
    }

    /// `GET /api/v1/job/{id}/status`.
    pub async fn get_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, UpstreamError> {
        let url = self.job_url(remote_job_id, Some("status"))?;
        self.get_json_at(&url).await
    }

    /// `GET /api/v1/job/{id}/results`.
    pub async fn get_results(&self, remote_job_id: &str) -> Result<Value, UpstreamError> {
        let url = self.job_url(remote_job_id, Some("results"))?;
        self.get_json_at(&url).await
    }

    /// `DELETE /api/v1/job/{id}`.
    pub async fn cancel(&self, remote_job_id: &str) -> Result<(), UpstreamError> {
        let url = self.job_url(remote_job_id, None)?;
        self.send(self.http.delete(&url), &url).await?;
        Ok(())
    }

    /// `POST /api/v1/job/{id}/retry`.
    pub async fn retry(&self, remote_job_id: &str) -> Result<(), UpstreamError> {
        let url = self.job_url(remote_job_id, Some("retry"))?;
        self.send(self.http.post(&url), &url).await?;
        Ok(())
    }

    /// `GET /api/v1/jobs/active`.
    pub async fn active_jobs(&self) -> Result<RemoteActiveJobs, UpstreamError> {
        self.get_json("/api/v1/jobs/active").await
    }

    /// `GET /api/v1/jobs/failed`.
    pub async fn failed_jobs(&self) -> Result<RemoteFailedJobs, UpstreamError> {
        self.get_json("/api/v1/jobs/failed").await
    }

    /// `GET /health/detailed`.
    pub async fn health(&self) -> Result<Value, UpstreamError> {
        self.get_json("/health/detailed").await
    }

    /// `GET /metrics`.
    pub async fn metrics(&self) -> Result<Value, UpstreamError> {
        self.get_json("/metrics").await
    }

    /// `GET /health`, used as the startup connectivity check.
    pub async fn ping(&self) -> Result<(), UpstreamError> {
        let url = self.url("/health");
        self.send(self.http.get(&url), &url).await?;
        Ok(())
    }
}

/// Pull a readable message out of an error body.
///
/// Processing services usually answer with `{"detail": ...}`, `{"error": ...}`
/// or `{"message": ...}`; anything else is truncated verbatim.
fn error_message(body: &str, status: u16) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for field in ["detail", "error", "message"] {
            match map.get(field) {
                Some(Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"detail":"Job not found"}"#, 404), "Job not found");
        assert_eq!(error_message(r#"{"error":"bad input"}"#, 400), "bad input");
        assert_eq!(error_message("", 503), "HTTP 503");
        assert_eq!(error_message("upstream exploded", 500), "upstream exploded");
    }

    #[test]
    fn test_base_url_must_be_http() {
        let config = UpstreamConfig {
            base_url: "ftp://ml".into(),
            ..UpstreamConfig::default()
        };
        let err = HttpProcessingClient::new(&config).unwrap_err();
        assert_eq!(err.kind, gateway_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = UpstreamConfig {
            base_url: "http://ml:8000/".into(),
            ..UpstreamConfig::default()
        };
        let client = HttpProcessingClient::new(&config).unwrap();
        assert_eq!(client.url("/health"), "http://ml:8000/health");
    }

    #[test]
    fn test_job_ids_are_encoded_as_one_segment() {
        let config = UpstreamConfig {
            base_url: "http://ml:8000/".into(),
            ..UpstreamConfig::default()
        };
        let client = HttpProcessingClient::new(&config).unwrap();

        assert_eq!(
            client.job_url("ml-1", Some("status")).unwrap(),
            "http://ml:8000/api/v1/job/ml-1/status"
        );
        assert_eq!(
            client.job_url("../admin?x=1#f", Some("retry")).unwrap(),
            "http://ml:8000/api/v1/job/..%2Fadmin%3Fx=1%23f/retry"
        );
        assert_eq!(
            client.job_url("a b%2F", None).unwrap(),
            "http://ml:8000/api/v1/job/a%20b%252F"
        );
        assert!(matches!(
            client.job_url("..", Some("status")).unwrap_err(),
            UpstreamError::Rejected { status: 400, .. }
        ));
    }

    #[test]
    fn test_job_url_keeps_base_path() {
        let config = UpstreamConfig {
            base_url: "https://gpu.internal/ml".into(),
            ..UpstreamConfig::default()
        };
        let client = HttpProcessingClient::new(&config).unwrap();
        assert_eq!(
            client.job_url("ml-9", Some("results")).unwrap(),
            "https://gpu.internal/ml/api/v1/job/ml-9/results"
        );
    }
}
