//! Content-type resolution.

use std::sync::LazyLock;

use regex::Regex;

/// Default `Content-Type` for JSON encodings.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default `Content-Type` for XML bodies.
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

static MIME_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+/.+$").expect("MIME pattern is a valid regex"));

/// Returns true if `value` looks like a full MIME type (`type/subtype`).
#[must_use]
pub fn looks_like_mime(value: &str) -> bool {
    MIME_TYPE.is_match(value)
}

/// The encoding selected by the `content_type` option.
///
/// Resolved once per cycle from the interpolated option, then matched
/// exhaustively by the request builder. Resolution order: `json`, `xml`,
/// MIME pattern, everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    /// `json`: JSON body (or JSON-flavored query string for GET).
    Json,
    /// `xml`: XML body.
    Xml,
    /// A literal MIME type; the payload is sent as a plain string.
    Mime(String),
    /// `form`, absent, or anything unrecognized: form encoding.
    FormOrOther,
}

impl ContentType {
    /// Resolves the interpolated `content_type` option.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("json") => Self::Json,
            Some("xml") => Self::Xml,
            Some(mime) if looks_like_mime(mime) => Self::Mime(mime.to_string()),
            _ => Self::FormOrOther,
        }
    }
}
