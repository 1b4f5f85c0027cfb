//! Job inspection and on-demand scans.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use fieldwatch_core::JobRecord;
use fieldwatch_jobs::ScanOutcome;

use super::LimitQuery;
use crate::{ApiError, AppState};

/// Upper bound on `GET /api/jobs`.
const MAX_JOB_PAGE: usize = 500;

/// Get one job record.
#[utoipa::path(get, path = "/api/job-status/{job_id}", tag = "Jobs",
    params(("job_id" = String, Path, description = "Job id, e.g. wildlife_2")),
    responses(
        (status = 200, description = "Job record"),
        (status = 404, description = "Unknown job id"),
    ))]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .stores
        .registry
        .get_job(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {} not found", job_id)))
}

/// List the most recently updated jobs.
#[utoipa::path(get, path = "/api/jobs", tag = "Jobs",
    params(("limit" = Option<usize>, Query, description = "Page size (default 10)")),
    responses(
        (status = 200, description = "Jobs, most recently updated first"),
    ))]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<JobRecord>> {
    let limit = query.resolve(MAX_JOB_PAGE);
    Json(state.stores.registry.list_recent(limit).await)
}

/// Run a scan cycle now.
///
/// # Returns
/// - 200 OK with the cycle report, or `{"skipped": true}` if a cycle was
///   already in flight
/// - 500 if a media source could not be listed
#[utoipa::path(post, path = "/api/scan", tag = "Jobs",
    responses(
        (status = 200, description = "Cycle report or skipped marker"),
        (status = 500, description = "Media source unreadable"),
    ))]
pub async fn trigger_scan(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match state.scheduler.trigger().await? {
        ScanOutcome::Skipped => Ok(Json(json!({ "skipped": true }))),
        ScanOutcome::Completed(report) => serde_json::to_value(report)
            .map(Json)
            .map_err(|e| ApiError::Internal(e.to_string())),
    }
}
