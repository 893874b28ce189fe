//! Wire types exchanged with the processing service.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One buffered uploaded file.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original client-side file name.
    pub file_name: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Size of the contents in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A job submission: the local job id, the files, and the caller's
/// credentials to pass through.
#[derive(Debug, Clone)]
pub struct Submission {
    pub job_id: String,
    pub files: Vec<UploadFile>,
    pub bearer_token: Option<String>,
}

/// Acknowledgement returned by `POST /api/v1/process-dicom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

/// Body of `GET /api/v1/job/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteJobStatus {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /api/v1/jobs/active`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteActiveJobs {
    #[serde(default)]
    pub processing: Vec<Value>,
    #[serde(default)]
    pub pending: Vec<Value>,
    #[serde(default)]
    pub total_active: usize,
}

/// Body of `GET /api/v1/jobs/failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFailedJobs {
    #[serde(default)]
    pub failed_jobs: Vec<Value>,
    #[serde(default)]
    pub count: usize,
}
