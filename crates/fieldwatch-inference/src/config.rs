//! Detector connection settings.

use std::time::Duration;

use fieldwatch_core::defaults;

/// Where the remote detector lives and how long one exchange may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DETECTOR_URL.to_string(),
            timeout: Duration::from_secs(defaults::DETECTOR_TIMEOUT_SECS),
        }
    }
}

impl DetectorConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DETECTOR_URL` | `http://localhost:9454` | Vision service base URL |
    /// | `DETECTOR_TIMEOUT_SECS` | `30` | Upper bound per request |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(defaults::ENV_DETECTOR_URL) {
            if !url.trim().is_empty() {
                config = config.with_base_url(url);
            }
        }
        if let Some(secs) = std::env::var(defaults::ENV_DETECTOR_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    /// Set the base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.base_url, "http://localhost:9454");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = DetectorConfig::default()
            .with_base_url("http://vision:9454/")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.base_url, "http://vision:9454");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
