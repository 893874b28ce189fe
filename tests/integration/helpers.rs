//! Shared test helpers for integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use chrono::{DateTime, Utc};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use gateway_api::AppState;
use gateway_auth::{Authenticator, JwtEncoder};
use gateway_cache::{CacheManager, JobStore};
use gateway_core::config::AppConfig;
use gateway_core::error::UpstreamError;
use gateway_core::traits::processing::ProcessingClient;
use gateway_core::types::processing::{
    RemoteActiveJobs, RemoteFailedJobs, RemoteJobStatus, SubmitReceipt, Submission,
};
use gateway_entity::user::{Identity, UserRole};

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const ADMIN: &str = "admin";

/// One submission as seen by the stub.
#[derive(Debug, Clone)]
pub struct SeenSubmission {
    pub job_id: String,
    pub file_names: Vec<String>,
    pub bearer_token: Option<String>,
}

/// In-process stand-in for the processing service.
#[derive(Default)]
pub struct StubProcessing {
    pub fail_submit: AtomicBool,
    pub unhealthy: AtomicBool,
    pub remote_status: Mutex<Option<RemoteJobStatus>>,
    pub results: Mutex<Option<Value>>,
    pub submissions: Mutex<Vec<SeenSubmission>>,
    pub cancelled: Mutex<Vec<String>>,
}

impl StubProcessing {
    pub fn report(&self, status: &str, progress: f64) {
        *self.remote_status.lock().unwrap() = Some(RemoteJobStatus {
            status: status.to_string(),
            progress: Some(progress),
            result: None,
            error: None,
        });
    }

    pub fn set_results(&self, results: Value) {
        *self.results.lock().unwrap() = Some(results);
    }

    fn down() -> UpstreamError {
        UpstreamError::Unavailable("stub is down".into())
    }
}

#[async_trait]
impl ProcessingClient for StubProcessing {
    async fn submit(&self, submission: Submission) -> Result<SubmitReceipt, UpstreamError> {
        self.submissions.lock().unwrap().push(SeenSubmission {
            job_id: submission.job_id.clone(),
            file_names: submission.files.iter().map(|f| f.file_name.clone()).collect(),
            bearer_token: submission.bearer_token.clone(),
        });
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(Self::down());
        }
        Ok(SubmitReceipt {
            job_id: format!("ml-{}", submission.job_id),
            status: Some("processing".into()),
            message: None,
            estimated_time: Some(format!("{}s", submission.files.len() * 30)),
        })
    }

    async fn get_status(&self, _remote_job_id: &str) -> Result<RemoteJobStatus, UpstreamError> {
        self.remote_status.lock().unwrap().clone().ok_or_else(Self::down)
    }

    async fn get_results(&self, _remote_job_id: &str) -> Result<Value, UpstreamError> {
        self.results.lock().unwrap().clone().ok_or_else(Self::down)
    }

    async fn cancel(&self, remote_job_id: &str) -> Result<(), UpstreamError> {
        self.cancelled.lock().unwrap().push(remote_job_id.to_string());
        Ok(())
    }

    async fn retry(&self, _remote_job_id: &str) -> Result<(), UpstreamError> {
        Ok(())
    }

    async fn active_jobs(&self) -> Result<RemoteActiveJobs, UpstreamError> {
        Ok(RemoteActiveJobs {
            processing: vec![json!({"job_id": "ml-remote-only"})],
            pending: vec![],
            total_active: 1,
        })
    }

    async fn failed_jobs(&self) -> Result<RemoteFailedJobs, UpstreamError> {
        Ok(RemoteFailedJobs::default())
    }

    async fn health(&self) -> Result<Value, UpstreamError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(Self::down());
        }
        Ok(json!({"status": "healthy"}))
    }

    async fn metrics(&self) -> Result<Value, UpstreamError> {
        Ok(json!({"jobs_processed": 42}))
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
    /// The processing service stand-in
    pub upstream: Arc<StubProcessing>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application backed by the in-memory store
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-secret".to_string();
        config.cache.provider = "memory".to_string();

        let cache = CacheManager::new(&config.cache)
            .await
            .expect("Failed to create cache");
        let store = JobStore::new(cache, config.cache.job_ttl_seconds);
        let upstream = Arc::new(StubProcessing::default());
        let authenticator =
            Arc::new(Authenticator::new(&config.auth).expect("Failed to build authenticator"));

        let state = AppState::new(
            Arc::new(config.clone()),
            store,
            Arc::clone(&upstream) as Arc<dyn ProcessingClient>,
            authenticator,
        );
        let router = gateway_api::build_router(state.clone());

        Self {
            router,
            state,
            upstream,
            config,
        }
    }

    /// A valid token for one of the test users
    pub fn token(&self, user_id: &str) -> String {
        self.token_at(user_id, Utc::now())
    }

    /// A token as if issued at `issued_at`
    pub fn token_at(&self, user_id: &str, issued_at: DateTime<Utc>) -> String {
        let role = if user_id == ADMIN {
            UserRole::ItAdministrator
        } else {
            UserRole::Radiologist
        };
        self.issue(user_id, role, issued_at)
    }

    /// A token carrying an arbitrary role claim
    pub fn token_for_role(&self, user_id: &str, role: &str) -> String {
        self.issue(user_id, UserRole::from(role), Utc::now())
    }

    fn issue(&self, user_id: &str, role: UserRole, issued_at: DateTime<Utc>) -> String {
        let identity = Identity {
            id: user_id.to_string(),
            email: format!("{user_id}@hospital.test"),
            role,
            name: user_id.to_string(),
            hospital: Some("General".to_string()),
        };
        JwtEncoder::new(&self.config.auth)
            .issue_at(&identity, issued_at)
            .expect("Failed to issue token")
            .token
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Upload files as a multipart body under the `files` field
    pub async fn upload(&self, files: &[(&str, &[u8])], token: Option<&str>) -> TestResponse {
        const BOUNDARY: &str = "gateway-test-boundary";
        let mut body = Vec::new();
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/dicom\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut req = Request::builder()
            .method("POST")
            .uri("/api/dicom/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let req = req.body(Body::from(body)).expect("Failed to build request");

        self.send(req).await
    }

    /// Upload `count` small valid files as `user_id` and wait for the forward
    pub async fn upload_as(&self, user_id: &str, count: usize) -> String {
        let names: Vec<String> = (0..count).map(|i| format!("scan-{i}.dcm")).collect();
        let files: Vec<(&str, &[u8])> = names
            .iter()
            .map(|n| (n.as_str(), b"DICM".as_slice()))
            .collect();
        let response = self.upload(&files, Some(&self.token(user_id))).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        self.wait_for_forwards().await;
        response.body["jobId"]
            .as_str()
            .expect("No jobId in upload response")
            .to_string()
    }

    /// Wait until every background forward has finished
    pub async fn wait_for_forwards(&self) {
        for _ in 0..200 {
            if self.state.jobs.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background forwards did not finish");
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
