//! Liveness.

use axum::{extract::State, Json};
use serde::Serialize;

use fieldwatch_core::StatusKind;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether the detector answered a probe.
    pub detector: bool,
    pub scanning: bool,
    pub current_status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<StatusKind>,
    /// Whether an auto-reset is pending.
    pub reset_timer_armed: bool,
}

/// Report process health, detector reachability and status diagnostics.
#[utoipa::path(get, path = "/health", tag = "System",
    responses(
        (status = 200, description = "Service is up"),
    ))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let detector = state.detector.health_check().await.unwrap_or(false);
    let snapshot = state.stores.status.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        detector,
        scanning: state.scheduler.coordinator().is_running(),
        current_status: snapshot.current.status,
        previous_status: snapshot.previous.map(|p| p.status),
        reset_timer_armed: snapshot.timer_armed,
    })
}
