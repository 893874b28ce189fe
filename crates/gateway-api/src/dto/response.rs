//! Response DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use gateway_entity::job::{JobRecord, JobStatus};
use gateway_service::job::JobCounts;

/// Immediate answer to an accepted upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,
    /// Always `processing`: the hand-off has been scheduled.
    pub status: JobStatus,
    pub message: String,
    pub file_count: usize,
    pub estimated_time: String,
    pub progress: u8,
}

/// Caller-facing view of a job's progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_count: usize,
    pub file_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.job_id,
            status: record.status,
            progress: record.progress,
            created_at: record.created_at,
            updated_at: record.updated_at,
            file_count: record.file_count,
            file_names: record.file_names,
            result: record.result,
            error: record.error,
            estimated_time: record.estimated_time,
        }
    }
}

/// Outcome of a cancel or retry request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobActionResponse {
    pub message: String,
    pub job_id: String,
    pub status: JobStatus,
}

/// Jobs in flight across all users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJobsResponse {
    pub active_jobs: Vec<Value>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Job statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub stats: JobCounts,
    /// Processing service metrics; present for administrators only.
    pub ml_service: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Basic health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since startup.
    pub uptime: f64,
}

/// Health of one dependency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_checked: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn is_healthy(&self) -> bool {
        self.status != "error"
    }
}

/// Health check including each dependency.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Service metrics and statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub components: BTreeMap<String, Value>,
    pub failed_jobs: Value,
    pub forwards: ForwardMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardMetrics {
    pub in_flight: usize,
}
