//! Outbound request and response values plus the client seam.

use std::time::Duration;

use serde_json::{Map, Value};

use super::HttpError;

/// A file to be uploaded as one part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name reported to the server
    pub filename: String,
    /// Declared MIME type, if known
    pub content_type: Option<String>,
    /// File contents (fully buffered)
    pub bytes: Vec<u8>,
}

/// The value of one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    /// A plain text field.
    Text(String),
    /// A file field.
    File(UploadFile),
}

/// One named part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Form field name
    pub name: String,
    /// Field value
    pub value: PartValue,
}

impl Part {
    /// Creates a text part.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    /// Creates a file part.
    #[must_use]
    pub fn file(name: impl Into<String>, file: UploadFile) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File(file),
        }
    }
}

/// Request body in one of the encodings the dispatcher produces.
///
/// Form and multipart bodies are kept structured so the client can apply
/// the encoding (and its `Content-Type`) at send time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A literal text body sent as-is.
    Text(String),
    /// `application/x-www-form-urlencoded` key/value pairs.
    Form(Vec<(String, String)>),
    /// `multipart/form-data` parts.
    Multipart(Vec<Part>),
}

impl Body {
    /// Returns true if there is nothing to send.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Renders the body as a JSON value for diagnostic request logs.
    ///
    /// File contents are never included, only their names.
    #[must_use]
    pub fn to_log_value(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Form(pairs) => Value::Array(
                pairs
                    .iter()
                    .map(|(k, v)| Value::Array(vec![k.clone().into(), v.clone().into()]))
                    .collect(),
            ),
            Self::Multipart(parts) => {
                let mut map = Map::new();
                for part in parts {
                    let value = match &part.value {
                        PartValue::Text(text) => Value::String(text.clone()),
                        PartValue::File(file) => Value::String(format!("<file: {}>", file.filename)),
                    };
                    map.insert(part.name.clone(), value);
                }
                Value::Object(map)
            }
        }
    }
}

/// Per-request transport options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Overall request timeout
    pub timeout: Option<Duration>,
    /// Connection open timeout
    pub open_timeout: Option<Duration>,
}

/// A fully assembled outbound request.
///
/// Built once per handling cycle and handed to an [`HttpClient`]; `params`
/// are kept apart from `url` so clients can encode them at send time.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// One of GET, POST, PUT, PATCH, DELETE
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// Extra query parameters merged into the URL at send time
    pub params: Vec<(String, String)>,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Request body
    pub body: Body,
    /// Timeouts applied to this request only
    pub options: RequestOptions,
}

impl HttpRequest {
    /// Headers and params start empty, the body is [`Body::Empty`].
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            params: Vec::new(),
            headers: http::HeaderMap::new(),
            body: Body::Empty,
            options: RequestOptions::default(),
        }
    }

    /// Shorthand for a GET.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Shorthand for a POST.
    #[must_use]
    pub fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Appends a header value, keeping earlier values of the same name.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the extra query parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Sets the per-request options.
    #[must_use]
    pub const fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the URL with `params` appended to its query string.
    #[must_use]
    pub fn full_url(&self) -> url::Url {
        let mut url = self.url.clone();
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}

/// What the endpoint answered. The body is buffered whole and treated as
/// opaque text by the mapper.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body (fully buffered)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait for making HTTP requests.
///
/// # Design
///
/// The dispatcher only sees this seam; tests substitute mocks.
///
/// Connection pooling, TLS and proxying are entirely the implementation's
/// business; enforcement of [`RequestOptions`] timeouts belongs here too.
///
/// # Example
///
/// ```ignore
/// use http_dispatch::transport::{HttpClient, HttpRequest, HttpResponse, HttpError};
///
/// struct MockClient {
///     response: HttpResponse,
/// }
///
/// impl HttpClient for MockClient {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(self.response.clone())
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends one request. Exactly one attempt is made.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - Request times out ([`HttpError::Timeout`])
    /// - URL is invalid ([`HttpError::InvalidUrl`])
    /// - The implementation treats the response status as a failure
    ///   ([`HttpError::Status`])
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send;
}
