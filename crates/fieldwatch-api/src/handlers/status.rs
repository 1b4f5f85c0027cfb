//! Status HTTP handlers.
//!
//! Reading the current status, manual overrides, resets and simulated
//! events. Overrides and simulations go through the same status store as
//! scan cycles and compete with them for the last word.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use fieldwatch_core::{
    defaults, species, synthetic_job_id, AlertDetails, Category, CommitSource, JobKind, JobPatch,
    SpeciesInfo, StatusKind, SystemStatus, WildlifeSighting,
};
use fieldwatch_store::Stores;

use crate::{ApiError, AppState};

/// JSON body whose rejection is handled by the handler (an alias keeps
/// `utoipa::path` from tripping over the nested `Json`).
type JsonPayload<T> = Result<Json<T>, JsonRejection>;

/// Current status as clients poll it.
///
/// Wildlife fields appear only with `wildlife_alert`, `isOwner` only with
/// `intrusion_alert`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: StatusKind,
    pub job_id: String,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_animals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal_info: Option<Vec<&'static SpeciesInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_owner: Option<bool>,
}

impl StatusResponse {
    fn bare(status: SystemStatus) -> Self {
        Self {
            status: status.status,
            job_id: status.owner_job_id,
            last_updated: status.updated_at,
            detected_animals: None,
            animal_info: None,
            is_owner: None,
        }
    }
}

/// Decorate `status` with details from the job that owns it.
async fn describe(stores: &Stores, status: SystemStatus) -> StatusResponse {
    let kind = status.status;
    let job = match kind {
        StatusKind::WildlifeAlert | StatusKind::IntrusionAlert => {
            stores.registry.get_job(&status.owner_job_id).await
        }
        _ => None,
    };

    let mut response = StatusResponse::bare(status);
    if let Some(job) = job {
        match kind {
            StatusKind::WildlifeAlert => {
                let sighting = WildlifeSighting::from_labels(&job.detected_labels);
                response.detected_animals = Some(sighting.detected_animals);
                response.animal_info = Some(sighting.animal_info);
            }
            StatusKind::IntrusionAlert => response.is_owner = job.is_owner,
            _ => {}
        }
    }
    response
}

/// Get the current system status.
#[utoipa::path(get, path = "/api/status", tag = "Status",
    responses(
        (status = 200, description = "Current status"),
    ))]
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.stores.status.read().await;
    Json(describe(&state.stores, status).await)
}

/// Request body for a manual override.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub job_id: Option<String>,
}

/// Record a synthetic job unless `job_id` already names a job.
async fn record_synthetic(stores: &Stores, job_id: &str, patch: JobPatch) {
    if stores.registry.get_job(job_id).await.is_none() {
        stores.registry.put_job(job_id, patch).await;
    }
}

/// Override the system status.
///
/// # Returns
/// - 200 OK with the new status
/// - 400 Bad Request if `status` is missing or not a known value
#[utoipa::path(post, path = "/api/update-status", tag = "Status",
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status value"),
    ))]
pub async fn update_status(
    State(state): State<AppState>,
    payload: JsonPayload<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let raw = req
        .status
        .ok_or_else(|| ApiError::BadRequest("status is required".into()))?;
    let status: StatusKind = raw.parse()?;
    let job_id = req
        .job_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| synthetic_job_id("manual"));

    record_synthetic(
        &state.stores,
        &job_id,
        JobPatch::synthetic(JobKind::Manual, status),
    )
    .await;

    let outcome = state
        .stores
        .status
        .commit(status, job_id.clone(), CommitSource::Manual)
        .await;
    if status.is_alert() {
        state
            .stores
            .alerts
            .append(status, AlertDetails::Manual { job_id: job_id.clone() })
            .await;
    }

    info!(%status, job_id = %job_id, "Manual status override");
    Ok(Json(describe(&state.stores, outcome.status().clone()).await))
}

/// Force the status back to normal.
#[utoipa::path(post, path = "/api/reset-status", tag = "Status",
    responses(
        (status = 200, description = "Status reset to normal"),
    ))]
pub async fn reset_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state
        .stores
        .status
        .reset_to_normal(defaults::RESET_REASON_MANUAL)
        .await;
    Json(StatusResponse::bare(status))
}

/// Events a simulation can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedEvent {
    Wildlife,
    Intrusion,
    Weather,
    Normal,
}

impl SimulatedEvent {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "wildlife" | "animal" => Ok(SimulatedEvent::Wildlife),
            "intrusion" | "human" => Ok(SimulatedEvent::Intrusion),
            "weather" => Ok(SimulatedEvent::Weather),
            "normal" => Ok(SimulatedEvent::Normal),
            other => Err(ApiError::BadRequest(format!(
                "unknown simulation event '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimulatedEvent::Wildlife => "wildlife",
            SimulatedEvent::Intrusion => "intrusion",
            SimulatedEvent::Weather => "weather",
            SimulatedEvent::Normal => "normal",
        }
    }

    pub fn status(&self) -> StatusKind {
        match self {
            SimulatedEvent::Wildlife => StatusKind::WildlifeAlert,
            SimulatedEvent::Intrusion => StatusKind::IntrusionAlert,
            SimulatedEvent::Weather => StatusKind::WeatherAlert,
            SimulatedEvent::Normal => StatusKind::Normal,
        }
    }
}

/// Request body for a simulated event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub event: String,
    pub simulation_job_id: Option<String>,
    /// Wildlife species to report; defaults to Gorani.
    pub species: Option<String>,
}

/// Inject a simulated event, bypassing detection.
///
/// # Returns
/// - 200 OK with the new status
/// - 400 Bad Request for an unknown event or species
#[utoipa::path(post, path = "/api/simulate", tag = "Status",
    responses(
        (status = 200, description = "Simulated event applied"),
        (status = 400, description = "Unknown event or species"),
    ))]
pub async fn simulate(
    State(state): State<AppState>,
    payload: JsonPayload<SimulateRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let event = SimulatedEvent::parse(&req.event)?;
    let status = event.status();
    let job_id = req
        .simulation_job_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| synthetic_job_id("simulation"));

    let mut patch = JobPatch::synthetic(JobKind::Simulation, status);
    match event {
        SimulatedEvent::Wildlife => {
            let name = req.species.as_deref().unwrap_or(defaults::SIMULATION_SPECIES);
            let info = species::lookup(name)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown species '{}'", name)))?;
            patch = patch
                .with_category(Category::Wildlife)
                .with_labels(vec![info.code.to_string()]);
        }
        SimulatedEvent::Intrusion => {
            patch = patch.with_category(Category::Intrusion).with_owner(false);
        }
        SimulatedEvent::Weather | SimulatedEvent::Normal => {}
    }
    record_synthetic(&state.stores, &job_id, patch).await;

    let outcome = state
        .stores
        .status
        .commit(status, job_id.clone(), CommitSource::Simulation)
        .await;
    if status.is_alert() {
        state
            .stores
            .alerts
            .append(
                status,
                AlertDetails::Simulated {
                    event: event.as_str().to_string(),
                    job_id: job_id.clone(),
                },
            )
            .await;
    }

    info!(event = event.as_str(), job_id = %job_id, "Simulated event injected");
    Ok(Json(describe(&state.stores, outcome.status().clone()).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_event_parse() {
        assert_eq!(
            SimulatedEvent::parse("Wildlife").unwrap(),
            SimulatedEvent::Wildlife
        );
        assert_eq!(
            SimulatedEvent::parse("human").unwrap(),
            SimulatedEvent::Intrusion
        );
        assert_eq!(
            SimulatedEvent::Weather.status(),
            StatusKind::WeatherAlert
        );
        assert!(matches!(
            SimulatedEvent::parse("earthquake"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_bare_response_omits_details() {
        let response = StatusResponse::bare(SystemStatus::initial());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "normal");
        assert_eq!(json["jobId"], "init");
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("detectedAnimals").is_none());
        assert!(json.get("isOwner").is_none());
    }
}
