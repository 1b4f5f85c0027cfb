//! HTTP detector backend.
//!
//! Talks to the vision service over multipart uploads: one endpoint for
//! object detection on wildlife frames, one for owner verification on face
//! frames, plus a fetch of the annotated result image.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use fieldwatch_core::{defaults, Category, DetectionClient, DetectionResult, Error, Result};

use crate::config::DetectorConfig;

/// Health probes use a shorter bound than detections.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Detector reached over HTTP.
pub struct HttpDetectionClient {
    config: DetectorConfig,
    client: reqwest::Client,
}

impl HttpDetectionClient {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create from `DETECTOR_URL` / `DETECTOR_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::new(DetectorConfig::from_env())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn endpoint(&self, category: Category) -> String {
        let path = match category {
            Category::Wildlife => defaults::DETECTOR_WILDLIFE_PATH,
            Category::Intrusion => defaults::DETECTOR_INTRUSION_PATH,
        };
        format!("{}{}", self.config.base_url, path)
    }
}

/// Wildlife endpoint body. The vision service answers `objects`; `labels`
/// is accepted as well.
#[derive(Deserialize)]
struct WildlifeResponse {
    #[serde(alias = "objects")]
    labels: Vec<String>,
}

/// Face endpoint body. A missing or null owner flag means no face was found.
#[derive(Deserialize)]
struct IntrusionResponse {
    #[serde(default, rename = "isOwner", alias = "is_owner")]
    is_owner: Option<bool>,
}

/// MIME type for an image file, from its extension.
pub fn mime_for(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Turn a non-success status into the matching error.
async fn status_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        Error::DetectorUnavailable(format!("detector returned {}", status))
    } else {
        Error::Detector(format!("detector returned {}: {}", status, body))
    }
}

pub(crate) fn parse_response(category: Category, body: &[u8]) -> Result<DetectionResult> {
    let parsed = match category {
        Category::Wildlife => serde_json::from_slice::<WildlifeResponse>(body)
            .map(|r| DetectionResult::Wildlife { labels: r.labels }),
        Category::Intrusion => serde_json::from_slice::<IntrusionResponse>(body)
            .map(|r| DetectionResult::Intrusion { is_owner: r.is_owner }),
    };
    parsed.map_err(|e| Error::Detector(format!("malformed detector response: {}", e)))
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn submit(
        &self,
        category: Category,
        job_id: &str,
        file: &Path,
    ) -> Result<DetectionResult> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            Error::Detector(format!("failed to read {}: {}", file.display(), e))
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("frame")
            .to_string();

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(file))
            .map_err(|e| Error::Internal(format!("Failed to create multipart: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("job_id", job_id.to_string())
            .text("category", category.as_str());

        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint(category))
            .multipart(form)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            warn!(job_id, %category, error = %err, "Detection request rejected");
            return Err(err);
        }

        let body = response.bytes().await?;
        let result = parse_response(category, &body)?;
        debug!(
            job_id,
            %category,
            duration_ms = started.elapsed().as_millis() as u64,
            ?result,
            "Detection answered"
        );
        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(&self.config.base_url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => Ok(!resp.status().is_server_error()),
            Err(_) => Ok(false),
        }
    }

    async fn annotated_image(&self, job_id: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}{}/{}",
            self.config.base_url,
            defaults::DETECTOR_IMAGE_PATH,
            job_id
        );
        let response = self
            .client
            .get(&url)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("no annotated image for {}", job_id)));
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for(Path::new("animals/1.jpg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("face/2.JPEG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("face/2.png")), "image/png");
        assert_eq!(mime_for(Path::new("clip")), "application/octet-stream");
    }

    #[test]
    fn test_parse_wildlife_objects_and_labels() {
        let from_objects = parse_response(Category::Wildlife, br#"{"objects":["Noru"]}"#).unwrap();
        let from_labels = parse_response(Category::Wildlife, br#"{"labels":["Noru"]}"#).unwrap();
        let expected = DetectionResult::Wildlife {
            labels: vec!["Noru".to_string()],
        };
        assert_eq!(from_objects, expected);
        assert_eq!(from_labels, expected);
    }

    #[test]
    fn test_parse_intrusion_owner_tri_state() {
        assert_eq!(
            parse_response(Category::Intrusion, br#"{"isOwner":false}"#).unwrap(),
            DetectionResult::Intrusion {
                is_owner: Some(false)
            }
        );
        assert_eq!(
            parse_response(Category::Intrusion, br#"{"is_owner":true}"#).unwrap(),
            DetectionResult::Intrusion {
                is_owner: Some(true)
            }
        );
        assert_eq!(
            parse_response(Category::Intrusion, br#"{"isOwner":null}"#).unwrap(),
            DetectionResult::Intrusion { is_owner: None }
        );
        assert_eq!(
            parse_response(Category::Intrusion, b"{}").unwrap(),
            DetectionResult::Intrusion { is_owner: None }
        );
    }

    #[test]
    fn test_parse_malformed_is_detector_error() {
        let err = parse_response(Category::Wildlife, b"<html>").unwrap_err();
        assert!(matches!(err, Error::Detector(_)));
    }

    #[test]
    fn test_endpoint_per_category() {
        let client =
            HttpDetectionClient::new(DetectorConfig::default().with_base_url("http://vision:1"));
        assert_eq!(
            client.endpoint(Category::Wildlife),
            "http://vision:1/api/detect-animals"
        );
        assert_eq!(
            client.endpoint(Category::Intrusion),
            "http://vision:1/api/detect-face"
        );
    }
}
