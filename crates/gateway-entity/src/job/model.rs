//! Job record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::status::JobStatus;

/// Progress reported right after the files were handed to the processing service.
pub const FORWARDED_PROGRESS: u8 = 20;

/// A tracked upload job, stored as one JSON document per job.
///
/// The serialized field names are the persisted layout and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique job identifier, also the store key.
    pub job_id: String,
    /// Identity of the user who uploaded the files.
    #[serde(rename = "userId")]
    pub owner_id: String,
    /// Number of uploaded files.
    pub file_count: usize,
    /// Original file names.
    pub file_names: Vec<String>,
    /// Current status.
    pub status: JobStatus,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
    /// Progress percentage, 0-100.
    pub progress: u8,
    /// Identifier assigned by the processing service.
    #[serde(rename = "mlJobId", default, skip_serializing_if = "Option::is_none")]
    pub remote_job_id: Option<String>,
    /// Processing time estimate from the processing service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    /// Result payload of a completed job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Short failure summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Underlying failure detail.
    #[serde(rename = "details", default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl JobRecord {
    /// Create a freshly uploaded job with a generated identifier.
    pub fn new(owner_id: impl Into<String>, file_names: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            file_count: file_names.len(),
            file_names,
            status: JobStatus::Uploading,
            created_at: now,
            updated_at: now,
            progress: 0,
            remote_job_id: None,
            estimated_time: None,
            result: None,
            error: None,
            error_details: None,
        }
    }

    /// Check whether `user_id` created this job.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Record a successful hand-off to the processing service.
    ///
    /// The remote identifier is only ever set once. The status moves to
    /// `processing` only from `uploading`; a job cancelled in the meantime
    /// stays cancelled.
    pub fn mark_forwarded(&mut self, remote_job_id: String, estimated_time: Option<String>) {
        if self.remote_job_id.is_none() {
            self.remote_job_id = Some(remote_job_id);
        }
        if estimated_time.is_some() {
            self.estimated_time = estimated_time;
        }
        if self.status == JobStatus::Uploading {
            self.status = JobStatus::Processing;
            self.progress = self.progress.max(FORWARDED_PROGRESS);
        }
        self.touch();
    }

    /// Record a failed hand-off to the processing service.
    pub fn mark_forward_failed(&mut self, error: impl Into<String>, details: impl Into<String>) {
        if self.status == JobStatus::Uploading {
            self.status = JobStatus::Failed;
            self.error = Some(error.into());
            self.error_details = Some(details.into());
        }
        self.touch();
    }

    /// Merge a status report from the processing service.
    ///
    /// Returns `true` when any field changed.
    pub fn apply_remote(
        &mut self,
        status: Option<JobStatus>,
        progress: Option<u8>,
        result: Option<Value>,
        error: Option<String>,
    ) -> bool {
        let mut changed = false;
        if let Some(status) = status {
            if self.status != status {
                self.status = status;
                changed = true;
            }
        }
        if let Some(progress) = progress {
            let progress = progress.min(100);
            if self.progress != progress {
                self.progress = progress;
                changed = true;
            }
        }
        if result.is_some() && self.result != result {
            self.result = result;
            changed = true;
        }
        if error.is_some() && self.error != error {
            self.error = error;
            changed = true;
        }
        if changed {
            self.touch();
        }
        changed
    }

    /// Mark the job cancelled.
    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.touch();
    }

    /// Put a failed job back in the queue.
    pub fn reset_for_retry(&mut self) {
        self.status = JobStatus::Pending;
        self.progress = 0;
        self.error = None;
        self.error_details = None;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord::new("user-1", vec!["a.dcm".into(), "b.dicom".into()])
    }

    #[test]
    fn test_new_record_is_uploading() {
        let job = record();
        assert_eq!(job.status, JobStatus::Uploading);
        assert_eq!(job.file_count, 2);
        assert_eq!(job.progress, 0);
        assert!(job.remote_job_id.is_none());
        assert!(job.is_owned_by("user-1"));
        assert!(!job.is_owned_by("user-2"));
    }

    #[test]
    fn test_persisted_layout() {
        let mut job = record();
        job.mark_forwarded("ml-7".into(), Some("60s".into()));
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["mlJobId"], "ml-7");
        assert_eq!(json["fileNames"][1], "b.dicom");
        assert_eq!(json["status"], "processing");
        assert!(json.get("error").is_none());

        let back: JobRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_remote_id_is_set_once() {
        let mut job = record();
        job.mark_forwarded("first".into(), None);
        job.mark_forwarded("second".into(), None);
        assert_eq!(job.remote_job_id.as_deref(), Some("first"));
        assert_eq!(job.progress, FORWARDED_PROGRESS);
    }

    #[test]
    fn test_forward_after_cancel_keeps_cancelled() {
        let mut job = record();
        job.cancel();
        job.mark_forwarded("ml-1".into(), None);
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.remote_job_id.as_deref(), Some("ml-1"));

        job.mark_forward_failed("Failed to process files", "boom");
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_apply_remote_reports_changes() {
        let mut job = record();
        job.mark_forwarded("ml-1".into(), None);
        assert!(!job.apply_remote(Some(JobStatus::Processing), Some(20), None, None));
        assert!(job.apply_remote(
            Some(JobStatus::Completed),
            Some(100),
            Some(serde_json::json!({"ok": true})),
            None
        ));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_reset_for_retry_clears_failure() {
        let mut job = record();
        job.mark_forward_failed("Failed to process files", "connection refused");
        assert_eq!(job.status, JobStatus::Failed);
        job.reset_for_retry();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(job.error.is_none());
        assert!(job.error_details.is_none());
    }
}
