//! Header normalization.
//!
//! Outbound: the interpolated `headers` option becomes an
//! [`http::HeaderMap`]; encoding defaults are added later only when absent.
//!
//! Inbound: response headers are filtered and their keys rewritten in a
//! [`HeaderStyle`] before they are placed in an output event.

use std::fmt;
use std::str::FromStr;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use super::RequestError;
use crate::template::value_to_text;

/// How response header names are rewritten for emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderStyle {
    /// `Content-Type`
    #[default]
    Capitalized,
    /// `content-type`
    Downcased,
    /// `content_type`
    Snakecased,
    /// Unmodified from the transport.
    Raw,
}

impl HeaderStyle {
    /// Rewrites one header name.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Capitalized => name
                .split('-')
                .map(capitalize)
                .collect::<Vec<_>>()
                .join("-"),
            Self::Downcased => name.to_lowercase(),
            Self::Snakecased => name.to_lowercase().replace('-', "_"),
            Self::Raw => name.to_string(),
        }
    }

    /// The option value naming this style.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capitalized => "capitalized",
            Self::Downcased => "downcased",
            Self::Snakecased => "snakecased",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "capitalized" => Ok(Self::Capitalized),
            "downcased" => Ok(Self::Downcased),
            "snakecased" => Ok(Self::Snakecased),
            "raw" => Ok(Self::Raw),
            other => Err(other.to_string()),
        }
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Builds the outbound header map from the interpolated `headers` option.
///
/// Null yields an empty map. Non-string values are rendered as JSON text.
///
/// # Errors
///
/// Returns [`RequestError::InvalidHeader`] if the option is not a map or a
/// name/value is not valid HTTP.
pub fn build_headers(resolved: &Value) -> Result<HeaderMap, RequestError> {
    let mut headers = HeaderMap::new();
    let map = match resolved {
        Value::Null => return Ok(headers),
        Value::Object(map) => map,
        other => {
            return Err(RequestError::InvalidHeader {
                name: "headers".to_string(),
                reason: format!("expected a map, got {other}"),
            });
        }
    };

    for (name, value) in map {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| RequestError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(&value_to_text(value)).map_err(|e| {
            RequestError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Sets `name` to `value` unless the header is already present.
pub fn insert_default(headers: &mut HeaderMap, name: HeaderName, value: HeaderValue) {
    headers.entry(name).or_insert(value);
}

/// Renders outbound headers as a JSON map (for diagnostic logs).
#[must_use]
pub fn headers_to_map(headers: &HeaderMap) -> Map<String, Value> {
    normalize_response_headers(headers, HeaderStyle::Capitalized, None)
}

/// Filters response headers to `allowlist` (case-insensitive, if given) and
/// rewrites their names in `style`.
///
/// Repeated headers are joined with `", "`.
#[must_use]
pub fn normalize_response_headers(
    headers: &HeaderMap,
    style: HeaderStyle,
    allowlist: Option<&[String]>,
) -> Map<String, Value> {
    let mut normalized = Map::new();
    for name in headers.keys() {
        if let Some(allowed) = allowlist {
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(name.as_str())) {
                continue;
            }
        }
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        normalized.insert(style.apply(name.as_str()), Value::String(joined));
    }
    normalized
}
