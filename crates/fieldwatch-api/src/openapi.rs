//! OpenAPI document served at `/openapi.json`.

use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fieldwatch API",
        description = "Surveillance status engine: wildlife and intrusion detection over watched media sources"
    ),
    paths(
        handlers::status::get_status,
        handlers::status::update_status,
        handlers::status::reset_status,
        handlers::status::simulate,
        handlers::jobs::get_job_status,
        handlers::jobs::list_jobs,
        handlers::jobs::trigger_scan,
        handlers::alerts::list_alerts,
        handlers::alerts::last_alert,
        handlers::media::list_media,
        handlers::media::detection_image,
        handlers::system::health,
    ),
    tags(
        (name = "Status", description = "System status, overrides and simulations"),
        (name = "Jobs", description = "Detection jobs and scan cycles"),
        (name = "Alerts", description = "Alert history"),
        (name = "Media", description = "Watched media sources"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
