//! Error types for configuration parsing and validation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single rejected agent option.
///
/// The validator collects every violation, so these are reported together
/// inside [`ConfigError::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `endpoint` is missing or blank.
    #[error("endpoint is a required field")]
    MissingEndpoint,

    /// A query-style method was given a scalar payload.
    #[error("if provided, payload must be a hash or an array")]
    PayloadNotCollection,

    /// A body method was given a scalar payload without a literal MIME type.
    #[error(
        "if provided, payload must be a hash or an array unless content_type is a MIME type"
    )]
    PayloadNeedsMimeType,

    /// A string payload would be merged with event fields.
    #[error("when the payload is a string, `no_merge` has to be set to `true`")]
    StringPayloadMerged,

    /// A form body was given an array payload.
    #[error("when content_type is a form, if provided, payload must be a hash")]
    FormPayloadNotMap,

    /// A flag option that is neither `true` nor `false`.
    #[error("if provided, {0} must be true or false")]
    NotBoolean(&'static str),

    /// `output_mode` outside `clean`/`merge`.
    #[error("if provided, output_mode must be 'clean' or 'merge'")]
    InvalidOutputMode,

    /// `method` outside the supported verbs.
    #[error("method must be 'post', 'get', 'put', 'delete', or 'patch'")]
    InvalidMethod,

    /// `headers` is not a map.
    #[error("if provided, headers must be a hash")]
    HeadersNotMap,

    /// `event_headers` is neither a string list nor a comma-separated string.
    #[error("if provided, event_headers must be an array of strings or a comma-separated string")]
    InvalidEventHeaders,

    /// `event_headers_style` names no known style.
    #[error(
        "if provided, event_headers_style must be 'capitalized', 'downcased', 'snakecased', or 'raw'"
    )]
    InvalidEventHeadersStyle,

    /// `event_headers_key` is not a string.
    #[error("if provided, event_headers_key must be a string")]
    InvalidEventHeadersKey,

    /// `basic_auth` has an unusable shape.
    #[error("basic_auth must be \"username:password\" or [\"username\", \"password\"]")]
    InvalidBasicAuth,

    /// `user_agent` is not a string.
    #[error("if provided, user_agent must be a string")]
    InvalidUserAgent,

    /// A timeout that is not a whole number of seconds.
    #[error("if provided, {0} must be a non-negative integer")]
    InvalidTimeout(&'static str),
}

/// The full list of violations found in one option bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid duration value (zero or too large).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// The agent options failed validation.
    #[error("Invalid agent options: {0}")]
    Invalid(ValidationErrors),
}

impl ConfigError {
    /// Returns the individual validation failures, if this is a validation error.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Invalid(errors) => &errors.0,
            _ => &[],
        }
    }
}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Invalid(ValidationErrors(errors))
    }
}
