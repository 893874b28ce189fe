//! Job status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted locally, not yet handed to the processing service.
    Uploading,
    /// Reset by a retry, waiting for the processing service to pick it up.
    Pending,
    /// Being processed remotely.
    Processing,
    /// Finished successfully.
    Completed,
    /// Forwarding or remote processing failed.
    Failed,
    /// Cancelled by the owner or an administrator.
    Cancelled,
}

impl JobStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [JobStatus; 6] = [
        Self::Uploading,
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Non-terminal states are refreshed from the processing service on read
    /// and may be cancelled.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if the job can be retried.
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Interpret a status string reported by the processing service.
    ///
    /// Returns `None` for values the gateway does not track, in which case
    /// the local status is kept.
    pub fn from_remote(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pending" | "queued" => Some(Self::Pending),
            "processing" | "running" => Some(Self::Processing),
            "completed" | "succeeded" => Some(Self::Completed),
            "failed" | "error" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
