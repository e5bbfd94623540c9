//! The encoding-strategy dispatcher.
//!
//! Given the resolved method, endpoint, working data and content type,
//! [`build`] decides where the data goes (URL query, params, or body) and
//! how it is encoded.

use std::fmt;
use std::str::FromStr;

use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use url::Url;

use super::content_type::{ContentType, JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
use super::headers::{headers_to_map, insert_default};
use super::{RequestError, params, xml};
use crate::template::value_to_text;
use crate::transport::{Body, HttpRequest, Part, RequestOptions, UploadFile};

/// The supported HTTP verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    /// Returns true for verbs whose data travels in the request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// The lowercase option value naming this verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// The matching [`http::Method`].
    #[must_use]
    pub fn as_method(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Patch => http::Method::PATCH,
            Self::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            _ => Err(RequestError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Per-cycle encoding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    /// Resolved content type
    pub content_type: ContentType,
    /// Multipart field name for an attached file
    pub upload_key: String,
    /// Root element name for XML bodies
    pub xml_root: String,
}

/// The request as built for one handling cycle.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    /// Verb to send
    pub verb: HttpVerb,
    /// Target URL (GET+JSON data already folded into its query)
    pub url: Url,
    /// Query parameters the transport merges into the URL
    pub params: Vec<(String, String)>,
    /// Encoded body
    pub body: Body,
    /// Final headers
    pub headers: HeaderMap,
}

impl OutgoingRequest {
    /// Converts into a transport request with per-request options.
    #[must_use]
    pub fn into_http_request(self, options: RequestOptions) -> HttpRequest {
        let mut request = HttpRequest::new(self.verb.as_method(), self.url)
            .with_params(self.params)
            .with_body(self.body)
            .with_options(options);
        request.headers = self.headers;
        request
    }

    /// The diagnostic record written when request logging is enabled.
    #[must_use]
    pub fn log_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("method".to_string(), self.verb.as_str().into());
        record.insert("url".to_string(), self.url.as_str().into());
        record.insert("body".to_string(), self.body.to_log_value());
        record.insert(
            "headers".to_string(),
            Value::Object(headers_to_map(&self.headers)),
        );
        record
    }
}

/// Builds the outgoing request.
///
/// - `get`: with [`ContentType::Json`], data (minus empty values) is folded
///   into the URL and a JSON `Content-Type` is defaulted; otherwise data
///   becomes params. No body.
/// - `delete`: data becomes params. No body.
/// - `post`/`put`/`patch`: an `upload` forces a multipart body under
///   `upload_key` and the content type is ignored. Otherwise JSON, XML,
///   literal-MIME text, or form encoding per the content type.
///
/// An explicit `Content-Type` in `headers` always wins over the defaults.
///
/// # Errors
///
/// Returns [`RequestError`] if the method is unsupported, the endpoint is
/// not a URL, or the data cannot be encoded as requested.
pub fn build(
    method: &str,
    endpoint: &str,
    data: Value,
    mut headers: HeaderMap,
    encoding: &Encoding,
    upload: Option<UploadFile>,
) -> Result<OutgoingRequest, RequestError> {
    let verb: HttpVerb = method.parse()?;
    let mut url = Url::parse(endpoint).map_err(|e| RequestError::InvalidUrl {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    let mut query = Vec::new();
    let mut body = Body::Empty;

    match verb {
        HttpVerb::Get => {
            if encoding.content_type == ContentType::Json {
                insert_default(
                    &mut headers,
                    CONTENT_TYPE,
                    HeaderValue::from_static(JSON_CONTENT_TYPE),
                );
                let pairs = params::to_pairs(&params::compact(data))?;
                if !pairs.is_empty() {
                    url.query_pairs_mut().extend_pairs(pairs);
                }
            } else {
                query = params::to_pairs(&data)?;
            }
        }
        HttpVerb::Delete => query = params::to_pairs(&data)?,
        HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch => {
            body = match upload {
                Some(file) => multipart(data, &encoding.upload_key, file)?,
                None => encode_body(data, encoding, &mut headers)?,
            };
        }
    }

    Ok(OutgoingRequest {
        verb,
        url,
        params: query,
        body,
        headers,
    })
}

fn encode_body(
    data: Value,
    encoding: &Encoding,
    headers: &mut HeaderMap,
) -> Result<Body, RequestError> {
    match &encoding.content_type {
        ContentType::Json => {
            insert_default(headers, CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            let json =
                serde_json::to_string(&data).map_err(|e| RequestError::Encoding(e.to_string()))?;
            Ok(Body::Text(json))
        }
        ContentType::Xml => {
            insert_default(headers, CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
            Ok(Body::Text(xml::to_xml(&data, &encoding.xml_root)?))
        }
        ContentType::Mime(mime) => {
            let value = HeaderValue::from_str(mime).map_err(|e| RequestError::InvalidHeader {
                name: CONTENT_TYPE.to_string(),
                reason: e.to_string(),
            })?;
            insert_default(headers, CONTENT_TYPE, value);
            Ok(Body::Text(value_to_text(&data)))
        }
        ContentType::FormOrOther => match data {
            Value::String(text) => Ok(Body::Text(text)),
            other => Ok(Body::Form(params::to_pairs(&other)?)),
        },
    }
}

fn multipart(data: Value, upload_key: &str, file: UploadFile) -> Result<Body, RequestError> {
    let Value::Object(fields) = data else {
        return Err(RequestError::Encoding(format!(
            "file uploads need a map payload, got {data}"
        )));
    };

    let mut parts = Vec::new();
    for (name, value) in fields {
        if name == upload_key {
            continue;
        }
        let mut field = Map::new();
        field.insert(name, value);
        for (key, text) in params::to_pairs(&Value::Object(field))? {
            parts.push(Part::text(key, text));
        }
    }
    parts.push(Part::file(upload_key, file));

    Ok(Body::Multipart(parts))
}
