//! Extension points implemented outside the core.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Category, DetectionResult};

/// Client for the remote vision service.
///
/// One call submits one media item. Implementations must return
/// [`Error::DetectorUnavailable`] or [`Error::Detector`] on failure; callers
/// treat either as a dropped observation.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// Submit the file at `file` for detection under `job_id`.
    async fn submit(&self, category: Category, job_id: &str, file: &Path)
        -> Result<DetectionResult>;

    /// Check if the detector is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Fetch the annotated result image the detector saved for `job_id`.
    async fn annotated_image(&self, job_id: &str) -> Result<Vec<u8>> {
        Err(Error::NotFound(format!("no annotated image for {}", job_id)))
    }

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}
