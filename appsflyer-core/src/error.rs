//! Error types for appsflyer-core

use std::time::Duration;

use thiserror::Error;

use crate::config::Platform;

/// Main error type for the appsflyer-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Event rejected before dispatch (e.g. missing event name)
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// No app is registered for the event's platform
    #[error("no app configured for platform {0}")]
    UnknownPlatform(Platform),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// DNS, connect, TLS or body transfer failure
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Caller-supplied deadline elapsed before the response arrived
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint answered with anything other than 200
    #[error("AppsFlyer server response {status}")]
    Remote { status: reqwest::StatusCode },
}

/// Result type alias for appsflyer-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_carries_status_line() {
        let err = Error::Remote {
            status: reqwest::StatusCode::FORBIDDEN,
        };
        assert_eq!(err.to_string(), "AppsFlyer server response 403 Forbidden");
    }

    #[test]
    fn test_unknown_platform_message() {
        let err = Error::UnknownPlatform(Platform::Ios);
        assert_eq!(err.to_string(), "no app configured for platform ios");
    }
}
