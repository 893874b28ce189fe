//! Upload validation and job listing configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to every upload before a job is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum number of files per upload.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum size of a single file in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Accepted file extensions, including the leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Seconds of processing estimated per file.
    #[serde(default = "default_seconds_per_file")]
    pub seconds_per_file: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size_bytes: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
            seconds_per_file: default_seconds_per_file(),
        }
    }
}

/// Job listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Maximum number of jobs returned by a listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

fn default_max_files() -> usize {
    10
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".dcm".to_string(), ".dicom".to_string()]
}

fn default_seconds_per_file() -> u64 {
    30
}

fn default_list_limit() -> usize {
    50
}
