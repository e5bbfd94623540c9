//! Error types for HTTP operations.

use thiserror::Error;

/// Error type for HTTP operations.
///
/// Describes what went wrong without dictating recovery strategy.
/// The dispatcher never retries; every variant ends the handling cycle.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// TLS handshake failures and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be assembled (bad multipart part, etc.).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with a non-success status and the client is
    /// configured to treat that as a failure.
    #[error("Server responded with status {status}")]
    Status {
        /// Response status code
        status: http::StatusCode,
        /// Response body, lossily decoded
        body: String,
    },

    /// The underlying client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl HttpError {
    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
