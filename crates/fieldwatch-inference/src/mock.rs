//! Scripted detector backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldwatch_inference::mock::MockDetectionClient;
//! use fieldwatch_inference::DetectionResult;
//!
//! let detector = MockDetectionClient::new()
//!     .with_result("2.jpg", DetectionResult::Wildlife { labels: vec!["Noru".into()] })
//!     .with_failure("3.jpg");
//! ```
//!
//! Items are matched by their `category/file` key first, then by bare file
//! name. Anything not scripted answers with the empty result for its
//! category.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fieldwatch_core::{item_key, Category, DetectionClient, DetectionResult, Error, Result};

/// One `submit` call as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub category: Category,
    pub job_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    results: HashMap<String, DetectionResult>,
    failures: HashSet<String>,
    images: HashMap<String, Vec<u8>>,
    latency: Duration,
    healthy: bool,
}

/// Mock detector for testing.
#[derive(Clone)]
pub struct MockDetectionClient {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for MockDetectionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDetectionClient {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig {
                healthy: true,
                ..Default::default()
            }),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer `result` for the item matching `key`.
    pub fn with_result(mut self, key: impl Into<String>, result: DetectionResult) -> Self {
        Arc::make_mut(&mut self.config)
            .results
            .insert(key.into(), result);
        self
    }

    /// Fail the item matching `key` with `DetectorUnavailable`.
    pub fn with_failure(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failures.insert(key.into());
        self
    }

    /// Serve `bytes` as the annotated image of `job_id`.
    pub fn with_image(mut self, job_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Arc::make_mut(&mut self.config)
            .images
            .insert(job_id.into(), bytes);
        self
    }

    /// Delay every submission by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    pub fn with_healthy(mut self, healthy: bool) -> Self {
        Arc::make_mut(&mut self.config).healthy = healthy;
        self
    }

    /// Every recorded call, in submission order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.call_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Job ids submitted so far, in order.
    pub fn submitted_job_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.job_id).collect()
    }
}

#[async_trait]
impl DetectionClient for MockDetectionClient {
    async fn submit(
        &self,
        category: Category,
        job_id: &str,
        file: &Path,
    ) -> Result<DetectionResult> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.call_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                category,
                job_id: job_id.to_string(),
                file_name: file_name.clone(),
            });

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let keyed = item_key(category, &file_name);
        if self.config.failures.contains(&keyed) || self.config.failures.contains(&file_name) {
            return Err(Error::DetectorUnavailable(format!(
                "scripted failure for {}",
                keyed
            )));
        }

        Ok(self
            .config
            .results
            .get(&keyed)
            .or_else(|| self.config.results.get(&file_name))
            .cloned()
            .unwrap_or(match category {
                Category::Wildlife => DetectionResult::Wildlife { labels: Vec::new() },
                Category::Intrusion => DetectionResult::Intrusion { is_owner: None },
            }))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.config.healthy)
    }

    async fn annotated_image(&self, job_id: &str) -> Result<Vec<u8>> {
        self.config
            .images
            .get(job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no annotated image for {}", job_id)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_results_and_log() {
        let detector = MockDetectionClient::new()
            .with_result(
                "2.jpg",
                DetectionResult::Wildlife {
                    labels: vec!["Noru".into()],
                },
            )
            .with_failure("3.jpg")
            .with_result(
                "intrusion/2.jpg",
                DetectionResult::Intrusion {
                    is_owner: Some(true),
                },
            );

        let owner = detector
            .submit(Category::Intrusion, "intrusion_2", Path::new("face/2.jpg"))
            .await
            .unwrap();
        assert_eq!(
            owner,
            DetectionResult::Intrusion {
                is_owner: Some(true)
            }
        );

        let hit = detector
            .submit(Category::Wildlife, "wildlife_2", Path::new("animals/2.jpg"))
            .await
            .unwrap();
        assert_eq!(
            hit,
            DetectionResult::Wildlife {
                labels: vec!["Noru".into()]
            }
        );

        let err = detector
            .submit(Category::Wildlife, "wildlife_3", Path::new("animals/3.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DetectorUnavailable(_)));

        let default = detector
            .submit(Category::Intrusion, "intrusion_1", Path::new("face/1.jpg"))
            .await
            .unwrap();
        assert_eq!(default, DetectionResult::Intrusion { is_owner: None });

        assert_eq!(
            detector.submitted_job_ids(),
            vec!["intrusion_2", "wildlife_2", "wildlife_3", "intrusion_1"]
        );
    }

    #[tokio::test]
    async fn test_images_and_health() {
        let detector = MockDetectionClient::new()
            .with_image("wildlife_1", vec![0xFF, 0xD8])
            .with_healthy(false);
        assert_eq!(
            detector.annotated_image("wildlife_1").await.unwrap(),
            vec![0xFF, 0xD8]
        );
        assert!(matches!(
            detector.annotated_image("wildlife_9").await,
            Err(Error::NotFound(_))
        ));
        assert!(!detector.health_check().await.unwrap());
    }
}
