//! Error types for request construction.

use thiserror::Error;

/// Error building an outgoing request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The method resolved outside the supported verbs.
    #[error("Invalid method '{0}'")]
    UnsupportedMethod(String),

    /// The endpoint is not a valid absolute URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The endpoint as resolved
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as configured
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// The payload cannot be encoded in the selected format.
    #[error("Encoding error: {0}")]
    Encoding(String),
}
