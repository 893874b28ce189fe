//! Upload validation.

use gateway_core::config::uploads::UploadConfig;
use gateway_core::error::AppError;
use gateway_core::result::AppResult;
use gateway_core::types::processing::UploadFile;

/// Limits every upload must satisfy before a job is created.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_files: usize,
    max_file_size_bytes: u64,
    allowed_extensions: Vec<String>,
    seconds_per_file: u64,
}

impl UploadPolicy {
    /// Build the policy from configuration. Extensions are compared
    /// case-insensitively and may be given with or without the leading dot.
    pub fn new(config: &UploadConfig) -> Self {
        let allowed_extensions = config
            .allowed_extensions
            .iter()
            .map(|ext| {
                let ext = ext.trim().to_ascii_lowercase();
                if ext.starts_with('.') { ext } else { format!(".{ext}") }
            })
            .collect();

        Self {
            max_files: config.max_files,
            max_file_size_bytes: config.max_file_size_bytes,
            allowed_extensions,
            seconds_per_file: config.seconds_per_file,
        }
    }

    /// Check count, extension, and size of every file.
    ///
    /// The first violation is reported; validation has no side effects.
    pub fn validate(&self, files: &[UploadFile]) -> AppResult<()> {
        if files.is_empty() {
            return Err(AppError::validation("Please upload at least one DICOM file")
                .titled("No files uploaded"));
        }

        if files.len() > self.max_files {
            return Err(
                AppError::validation(format!("Maximum {} files allowed", self.max_files))
                    .titled("Too many files")
                    .with_context("maxFiles", self.max_files),
            );
        }

        for file in files {
            if !self.has_allowed_extension(&file.file_name) {
                return Err(AppError::validation(format!(
                    "File {} is not a valid DICOM file. Only {} files are allowed.",
                    file.file_name,
                    self.allowed_extensions.join(" and ")
                ))
                .titled("Invalid file type"));
            }

            if file.size() > self.max_file_size_bytes {
                return Err(AppError::validation(format!(
                    "File {} exceeds maximum size of {}",
                    file.file_name,
                    human_size(self.max_file_size_bytes)
                ))
                .titled("File too large"));
            }
        }

        Ok(())
    }

    /// Processing time estimate shown to the uploader.
    pub fn estimated_time(&self, file_count: usize) -> String {
        format!("{}s", file_count as u64 * self.seconds_per_file)
    }

    fn has_allowed_extension(&self, file_name: &str) -> bool {
        let name = file_name.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|ext| name.ends_with(ext))
    }
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{bytes} bytes")
    }
}
