//! Alert history handlers.

use axum::{
    extract::{Query, State},
    Json,
};

use fieldwatch_core::AlertRecord;

use super::LimitQuery;
use crate::{ApiError, AppState};

/// List recent alerts, newest first.
#[utoipa::path(get, path = "/api/alerts", tag = "Alerts",
    params(("limit" = Option<usize>, Query, description = "Page size (default 10)")),
    responses(
        (status = 200, description = "Alerts, newest first"),
    ))]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<AlertRecord>> {
    let limit = query.resolve(state.stores.alerts.capacity());
    Json(state.stores.alerts.recent(limit).await)
}

/// Get the most recent alert.
#[utoipa::path(get, path = "/api/last-alert", tag = "Alerts",
    responses(
        (status = 200, description = "Most recent alert"),
        (status = 404, description = "No alert recorded yet"),
    ))]
pub async fn last_alert(State(state): State<AppState>) -> Result<Json<AlertRecord>, ApiError> {
    state
        .stores
        .alerts
        .last()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no alerts recorded".into()))
}
