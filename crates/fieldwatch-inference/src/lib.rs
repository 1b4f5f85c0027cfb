//! # fieldwatch-inference
//!
//! Detector backends for the fieldwatch scan engine.
//!
//! This crate provides:
//! - [`HttpDetectionClient`]: multipart adapter for the remote vision service
//! - [`DetectorConfig`]: base URL and per-request timeout
//! - A scripted backend for deterministic tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use fieldwatch_inference::{DetectionClient, HttpDetectionClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpDetectionClient::from_env();
//!     let healthy = client.health_check().await.unwrap_or(false);
//!     println!("detector reachable: {}", healthy);
//! }
//! ```

pub mod config;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use fieldwatch_core::*;

pub use config::DetectorConfig;
pub use http::HttpDetectionClient;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockDetectionClient, RecordedCall};
