//! Processing service client configuration.

use serde::{Deserialize, Serialize};

/// Upstream processing service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the processing service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for ordinary requests, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Timeout for file submissions, in seconds.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_seconds: u64,
    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            upload_timeout_seconds: default_upload_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_upload_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("imaging-gateway/{}", env!("CARGO_PKG_VERSION"))
}
