//! DICOM upload and per-job polling handlers.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::extract::multipart::MultipartError;
use serde_json::Value;
use tracing::info;

use gateway_core::error::AppError;
use gateway_core::types::processing::UploadFile;
use gateway_entity::job::JobStatus;
use gateway_service::job::INTAKE_PROGRESS;

use crate::dto::response::{JobActionResponse, JobStatusResponse, UploadResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

const UPLOAD_ACCEPTED: &str = "DICOM files uploaded successfully. Processing started.";
const JOB_CANCELLED: &str = "Job cancelled successfully";

/// POST /api/dicom/upload
///
/// Accepts every file part of the multipart body. The response is sent as
/// soon as the job is recorded; the files reach the processing service in
/// the background.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let files = read_files(multipart).await?;
    info!(user_id = %auth.user_id(), file_count = files.len(), "DICOM upload request received");

    let receipt = state.jobs.intake(&auth, files).await?;

    Ok(Json(UploadResponse {
        job_id: receipt.record.job_id,
        status: JobStatus::Processing,
        message: UPLOAD_ACCEPTED.to_string(),
        file_count: receipt.record.file_count,
        estimated_time: receipt.estimated_time,
        progress: INTAKE_PROGRESS,
    }))
}

/// GET /api/dicom/job/{job_id}/status
pub async fn job_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let record = state.jobs.get_status(&auth, &job_id).await?;
    Ok(Json(record.into()))
}

/// GET /api/dicom/job/{job_id}/results
pub async fn job_results(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let result = state.jobs.get_results(&auth, &job_id).await?;
    Ok(Json(result))
}

/// DELETE /api/dicom/job/{job_id}
pub async fn cancel_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> Result<Json<JobActionResponse>, ApiError> {
    let record = state.jobs.cancel(&auth, &job_id).await?;
    Ok(Json(JobActionResponse {
        message: JOB_CANCELLED.to_string(),
        job_id: record.job_id,
        status: record.status,
    }))
}

/// Buffer every file part of the upload.
async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(malformed)?;
        files.push(UploadFile {
            file_name,
            content_type,
            data,
        });
    }
    Ok(files)
}

fn malformed(err: MultipartError) -> ApiError {
    AppError::validation(format!("Could not read the uploaded files: {}", err.body_text()))
        .titled("Invalid upload")
        .into()
}
