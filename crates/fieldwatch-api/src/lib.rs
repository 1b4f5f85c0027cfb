//! # fieldwatch-api
//!
//! HTTP/JSON surface of the fieldwatch engine.
//!
//! The binary in `main.rs` wires configuration, logging and the scan
//! scheduler; this library exposes [`router`] so the routes can be served
//! from tests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use fieldwatch_core::{defaults, DetectionClient};
use fieldwatch_jobs::{ScanConfig, ScanCoordinator, Scheduler, SchedulerConfig};
use fieldwatch_store::Stores;

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub detector: Arc<dyn DetectionClient>,
    pub scheduler: Scheduler,
}

impl AppState {
    pub fn new(
        stores: Stores,
        detector: Arc<dyn DetectionClient>,
        scan_config: ScanConfig,
        scheduler_config: SchedulerConfig,
    ) -> Self {
        let coordinator = ScanCoordinator::new(stores.clone(), detector.clone(), scan_config);
        Self {
            stores,
            detector,
            scheduler: Scheduler::new(coordinator, scheduler_config),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let media_root = state.stores.library.root().to_path_buf();

    Router::new()
        .route("/health", get(handlers::system::health))
        .route("/openapi.json", get(openapi_json))
        // Status
        .route("/api/status", get(handlers::status::get_status))
        .route("/api/update-status", post(handlers::status::update_status))
        .route("/api/reset-status", post(handlers::status::reset_status))
        .route("/api/simulate", post(handlers::status::simulate))
        // Jobs
        .route("/api/job-status/:job_id", get(handlers::jobs::get_job_status))
        .route("/api/jobs", get(handlers::jobs::list_jobs))
        .route("/api/scan", post(handlers::jobs::trigger_scan))
        // Alerts
        .route("/api/alerts", get(handlers::alerts::list_alerts))
        .route("/api/last-alert", get(handlers::alerts::last_alert))
        // Media
        .route("/api/media/list", get(handlers::media::list_media))
        .route(
            "/api/detection-image/:job_id",
            get(handlers::media::detection_image),
        )
        .nest_service(defaults::MEDIA_URL_PREFIX, ServeDir::new(media_root))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
        .with_state(state)
}

/// Browsers poll the status from other origins; an empty list allows any.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}
