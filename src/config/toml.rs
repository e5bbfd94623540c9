//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All sections are optional so a file can hold only the agent options.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Agent options, kept as untyped JSON values
    #[serde(default)]
    pub agent: Map<String, Value>,

    /// Transport behavior
    #[serde(default)]
    pub transport: TransportSection,

    /// Scheduled checks
    #[serde(default)]
    pub schedule: ScheduleSection,
}

/// Transport configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    /// Treat non-2xx responses as request failures
    #[serde(default)]
    pub fail_on_status: bool,
}

/// Schedule configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleSection {
    /// Seconds between scheduled checks (no schedule when absent)
    pub interval: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# http-dispatch configuration file

[agent]
# Target URL, including the scheme (required). May use {{ field }} templates
# resolved against the triggering event.
endpoint = "http://www.example.com"

# One of: get, post, put, patch, delete (default: post)
method = "post"

# json, xml, form, or a literal MIME type such as "text/plain"
content_type = "json"

# Emit the response (or error) as an output event
emit_events = "true"

# Send the payload without merging the triggering event's fields
no_merge = "false"

# clean: output events hold only response fields
# merge: output events start from the triggering event
output_mode = "clean"

# Log every outgoing request
log_requests = "false"

# Request timeouts in seconds (0 or absent: no limit)
# timeout = 30
# open_timeout = 10

# Multipart field for attached files (default: file)
# upload_key = "file"

# Root element for XML bodies (default: post)
# xml_root = "post"

# Connection options
# basic_auth = "username:password"
# user_agent = "http-dispatch"
# disable_ssl_verification = "false"

# Response headers to keep in output events, and how to style their names
# (capitalized, downcased, snakecased, raw)
# event_headers = ["Content-Type", "ETag"]
# event_headers_style = "capitalized"
# event_headers_key = "headers"

[agent.payload]
key = "value"
something = "the event contained {{ somekey }}"

[agent.headers]
# Authorization = "Bearer your-token-here"

[transport]
# Treat non-2xx responses as failures (status carried into the error event)
fail_on_status = false

[schedule]
# Seconds between scheduled checks (absent: only run on events)
# interval = 300
"#
    .to_string()
}
