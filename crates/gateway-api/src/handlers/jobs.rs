//! Job listing and management handlers.

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;

use gateway_entity::job::JobRecord;
use gateway_service::job::JobListing;

use crate::dto::response::{ActiveJobsResponse, JobActionResponse, StatsResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<JobListing>, ApiError> {
    Ok(Json(state.jobs.list(&auth).await?))
}

/// GET /api/jobs/active (admin only)
pub async fn active_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ActiveJobsResponse>, ApiError> {
    require_admin(&state, &auth)?;

    let active = state.jobs.active().await?;
    let active_jobs = active.entries();
    Ok(Json(ActiveJobsResponse {
        count: active_jobs.len(),
        active_jobs,
        timestamp: Utc::now(),
    }))
}

/// GET /api/jobs/stats
pub async fn job_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.jobs.stats(&auth).await?;
    Ok(Json(StatsResponse {
        stats: stats.counts,
        ml_service: stats.remote_metrics,
        timestamp: Utc::now(),
    }))
}

/// GET /api/jobs/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    Ok(Json(state.jobs.get_job(&auth, &job_id).await?))
}

/// DELETE /api/jobs/{job_id}
pub async fn cancel_job(
    state: State<AppState>,
    auth: AuthUser,
    job_id: Path<String>,
) -> Result<Json<JobActionResponse>, ApiError> {
    super::dicom::cancel_job(state, auth, job_id).await
}

/// POST /api/jobs/{job_id}/retry
pub async fn retry_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> Result<Json<JobActionResponse>, ApiError> {
    let record = state.jobs.retry(&auth, &job_id).await?;
    Ok(Json(JobActionResponse {
        message: "Job retry initiated".to_string(),
        job_id: record.job_id,
        status: record.status,
    }))
}
