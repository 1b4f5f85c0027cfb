//! Error types for fieldwatch.

use thiserror::Error;

/// Result type alias using fieldwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fieldwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Detector could not be reached (connect failure, timeout, 503)
    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// Detector answered but the exchange failed
    #[error("Detector error: {0}")]
    Detector(String),

    /// Status value outside the known enum
    #[error("Invalid status value: {0}")]
    InvalidStatusValue(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested job or media item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::DetectorUnavailable(e.to_string())
        } else {
            Error::Detector(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_detector_unavailable() {
        let err = Error::DetectorUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Detector unavailable: connection refused");
    }

    #[test]
    fn test_error_display_detector() {
        let err = Error::Detector("HTTP 500".to_string());
        assert_eq!(err.to_string(), "Detector error: HTTP 500");
    }

    #[test]
    fn test_error_display_invalid_status() {
        let err = Error::InvalidStatusValue("panic_alert".to_string());
        assert_eq!(err.to_string(), "Invalid status value: panic_alert");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("job wildlife_9".to_string());
        assert_eq!(err.to_string(), "Not found: job wildlife_9");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
