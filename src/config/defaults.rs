//! Default values for configuration options.
//!
//! Centralized constants to avoid magic strings scattered across the codebase.

/// Default HTTP method.
pub const METHOD: &str = "post";

/// Default multipart field name for attached files.
pub const UPLOAD_KEY: &str = "file";

/// Default XML root element.
pub const XML_ROOT: &str = "post";

/// Default output-event key for response headers.
pub const EVENT_HEADERS_KEY: &str = "headers";

/// Default config file written by `init`.
pub const CONFIG_FILE: &str = "http-dispatch.toml";
