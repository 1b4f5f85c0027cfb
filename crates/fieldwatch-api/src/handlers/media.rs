//! Media listing and annotated detection images.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use fieldwatch_core::{Category, MediaItem};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    /// `wildlife` or `intrusion` (aliases accepted). Absent lists both.
    pub category: Option<String>,
}

/// One media item and whether it was already submitted.
#[derive(Debug, Serialize)]
pub struct MediaEntry {
    #[serde(flatten)]
    pub item: MediaItem,
    pub processed: bool,
}

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub items: Vec<MediaEntry>,
    pub count: usize,
}

/// List the items of the watched media sources in scan order.
///
/// # Returns
/// - 200 OK with the items and their processed flags
/// - 400 Bad Request for an unknown category
#[utoipa::path(get, path = "/api/media/list", tag = "Media",
    params(("category" = Option<String>, Query, description = "wildlife or intrusion")),
    responses(
        (status = 200, description = "Media items"),
        (status = 400, description = "Unknown category"),
    ))]
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<MediaListResponse>, ApiError> {
    let library = &state.stores.library;
    let items = match query.category.as_deref() {
        Some(raw) => library.list(raw.parse::<Category>()?).await?,
        None => library.list_all().await?,
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let processed = state.stores.processed.has(&item.key()).await;
        entries.push(MediaEntry { item, processed });
    }

    Ok(Json(MediaListResponse {
        count: entries.len(),
        items: entries,
    }))
}

/// Proxy the detector's annotated image for a job.
#[utoipa::path(get, path = "/api/detection-image/{job_id}", tag = "Media",
    params(("job_id" = String, Path, description = "Detection job id")),
    responses(
        (status = 200, description = "JPEG with bounding boxes", content_type = "image/jpeg"),
        (status = 404, description = "No annotated image"),
        (status = 503, description = "Detector unreachable"),
    ))]
pub async fn detection_image(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.detector.annotated_image(&job_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
