//! Centralized default constants for fieldwatch.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Environment variable names live next to the value they override.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8081;

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

// =============================================================================
// MEDIA SOURCES
// =============================================================================

/// Root directory holding one subdirectory per category.
pub const MEDIA_DIR: &str = "./media";

pub const ENV_MEDIA_DIR: &str = "FIELDWATCH_MEDIA_DIR";

/// URL prefix under which media files are served.
pub const MEDIA_URL_PREFIX: &str = "/media";

// =============================================================================
// DETECTOR
// =============================================================================

/// Base URL of the remote vision service.
pub const DETECTOR_URL: &str = "http://localhost:9454";

pub const ENV_DETECTOR_URL: &str = "DETECTOR_URL";

/// Upper bound on a single detector exchange.
pub const DETECTOR_TIMEOUT_SECS: u64 = 30;

pub const ENV_DETECTOR_TIMEOUT_SECS: &str = "DETECTOR_TIMEOUT_SECS";

/// Endpoint for wildlife (object) detection.
pub const DETECTOR_WILDLIFE_PATH: &str = "/api/detect-animals";

/// Endpoint for owner face verification.
pub const DETECTOR_INTRUSION_PATH: &str = "/api/detect-face";

/// Endpoint serving annotated result images, suffixed with the job id.
pub const DETECTOR_IMAGE_PATH: &str = "/api/image-result";

// =============================================================================
// SCANNING
// =============================================================================

/// Delay before the first scan after startup.
pub const SCAN_WARMUP_SECS: u64 = 5;

/// Interval between scheduled scans.
pub const SCAN_INTERVAL_SECS: u64 = 10;

/// Pause between two submissions within one cycle.
pub const SCAN_ITEM_DELAY_MS: u64 = 500;

// =============================================================================
// STATUS & ALERTS
// =============================================================================

/// Quiet period after which an alert status auto-resets to normal.
pub const STATUS_RESET_SECS: u64 = 60;

pub const ENV_STATUS_RESET_SECS: &str = "STATUS_RESET_SECS";

/// Maximum number of alert records retained.
pub const ALERT_LOG_CAPACITY: usize = 100;

pub const ENV_ALERT_LOG_CAPACITY: &str = "ALERT_LOG_CAPACITY";

/// Default page size for alert and job listings.
pub const PAGE_LIMIT: usize = 10;

/// Owner job id of the status installed at startup.
pub const INIT_JOB_ID: &str = "init";

/// Reset reason used by the auto-reset timer.
pub const RESET_REASON_TIMEOUT: &str = "auto_timeout";

/// Reset reason used by `POST /api/reset-status`.
pub const RESET_REASON_MANUAL: &str = "manual_request";

/// Species reported by a wildlife simulation when none is given.
pub const SIMULATION_SPECIES: &str = "Gorani";
