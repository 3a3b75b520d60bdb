//! Error types for b2-core
//!
//! Provides a unified error type shared by every B2 operation. All errors
//! propagate to the caller of the public operation; there is no retry or
//! partial-success reporting anywhere in the client.

use thiserror::Error;

/// Result type alias for B2 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for B2 operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid account credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// An authenticated call was attempted before the session was authorized
    #[error("Must be authorized to call endpoint: {endpoint}")]
    Unauthenticated {
        /// The endpoint the call was aimed at
        endpoint: String,
    },

    /// The API returned an HTTP status of 400 or above
    #[error("Received status code {status} making request to url {url}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Full request URL
        url: String,
        /// Best-effort JSON decode of the error body (Null when undecodable)
        body: serde_json::Value,
    },

    /// A large upload was started with a payload too small to split
    #[error(
        "Payload of {size} bytes splits into fewer than 2 parts \
         (minimum part size {minimum_part_size})"
    )]
    TooSmallForMultipart {
        /// Payload length in bytes
        size: u64,
        /// Minimum part size reported by the authorization handshake
        minimum_part_size: u64,
    },

    /// Transport-level error (connection, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The HTTP status code, when this error came from an API response
    pub const fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        let err = Error::Api {
            status: 401,
            url: "https://api.example/b2_list_buckets".into(),
            body: serde_json::Value::Null,
        };
        assert_eq!(err.status(), Some(401));

        let err = Error::Network("connection reset".into());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_display() {
        let err = Error::Unauthenticated {
            endpoint: "/b2_list_buckets".into(),
        };
        assert_eq!(
            err.to_string(),
            "Must be authorized to call endpoint: /b2_list_buckets"
        );

        let err = Error::TooSmallForMultipart {
            size: 0,
            minimum_part_size: 100,
        };
        assert!(err.to_string().contains("fewer than 2 parts"));
    }

    #[test]
    fn test_api_error_carries_body() {
        let err = Error::Api {
            status: 400,
            url: "https://api.example/b2_create_bucket".into(),
            body: serde_json::json!({"code": "duplicate_bucket_name"}),
        };
        assert!(err.to_string().contains("duplicate_bucket_name"));
        assert!(err.to_string().contains("400"));
    }
}
