//! The raw agent option bag and the helpers used to read it.
//!
//! Options arrive as an untyped JSON map (from the `[agent]` table of the
//! config file). Validation and [`Configuration`](super::Configuration)
//! construction read them through the helpers in this module so that
//! presence and boolean coercion mean the same thing everywhere.

use serde_json::{Map, Value};
use thiserror::Error;

/// Well-known option keys.
pub mod key {
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD: &str = "method";
    pub const CONTENT_TYPE: &str = "content_type";
    pub const PAYLOAD: &str = "payload";
    pub const HEADERS: &str = "headers";
    pub const BASIC_AUTH: &str = "basic_auth";
    pub const DISABLE_SSL_VERIFICATION: &str = "disable_ssl_verification";
    pub const USER_AGENT: &str = "user_agent";
    pub const NO_MERGE: &str = "no_merge";
    pub const OUTPUT_MODE: &str = "output_mode";
    pub const EMIT_EVENTS: &str = "emit_events";
    pub const LOG_REQUESTS: &str = "log_requests";
    pub const UPLOAD_KEY: &str = "upload_key";
    pub const XML_ROOT: &str = "xml_root";
    pub const TIMEOUT: &str = "timeout";
    pub const OPEN_TIMEOUT: &str = "open_timeout";
    pub const EVENT_HEADERS: &str = "event_headers";
    pub const EVENT_HEADERS_STYLE: &str = "event_headers_style";
    pub const EVENT_HEADERS_KEY: &str = "event_headers_key";
}

/// A value that should have been `true` or `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected true or false, got {0}")]
pub struct NotBoolean(pub String);

/// Coerces a boolean-flagged option value.
///
/// Accepts native booleans and the exact strings `"true"` and `"false"`.
///
/// # Errors
///
/// Returns [`NotBoolean`] for anything else, including null.
pub fn parse_boolish(value: &Value) -> Result<bool, NotBoolean> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(NotBoolean(other.to_string())),
    }
}

/// Returns true unless the value is null, a blank string, or an empty
/// map/array.
#[must_use]
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(true) | Value::Number(_) => true,
    }
}

/// The user-supplied agent options, exactly as configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentOptions(Map<String, Value>);

impl AgentOptions {
    /// Wraps a raw option map.
    #[must_use]
    pub const fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the raw value for `key`, if the key exists.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the raw value for `key`, or null when absent.
    #[must_use]
    pub fn value(&self, key: &str) -> Value {
        self.0.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns true if the key exists at all (even with a null value).
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns true if the key holds a present value (see [`is_present`]).
    #[must_use]
    pub fn is_present(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(is_present)
    }

    /// Returns the value as a string slice if it is a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for AgentOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
