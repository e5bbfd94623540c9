//! Production HTTP client implementation using reqwest.

use std::time::Duration;

use http::header::{CONTENT_TYPE, HeaderValue};
use reqwest::multipart::{Form, Part as ReqwestPart};

use super::{Body, HttpClient, HttpError, HttpRequest, HttpResponse, Part, PartValue};

/// Credentials attached to every request that lacks an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Connection-level settings for [`ReqwestClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    /// Custom `User-Agent` (reqwest's default when `None`)
    pub user_agent: Option<String>,
    /// Accept invalid TLS certificates
    pub disable_ssl_verification: bool,
    /// Pre-resolved basic auth credentials
    pub basic_auth: Option<BasicAuth>,
    /// Default connection open timeout
    pub open_timeout: Option<Duration>,
    /// Treat non-2xx responses as [`HttpError::Status`]
    pub fail_on_status: bool,
}

/// Production HTTP client using reqwest.
///
/// A thin wrapper around `reqwest::Client` that implements the
/// [`HttpClient`] trait. It inherits reqwest's connection pooling.
///
/// # Example
///
/// ```no_run
/// use http_dispatch::transport::{ReqwestClient, HttpClient, HttpRequest};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::new();
/// let url = Url::parse("https://api.example.com/hook")?;
/// let response = client.request(HttpRequest::get(url)).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
    settings: ClientSettings,
}

impl ReqwestClient {
    /// Creates a new HTTP client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
            settings: ClientSettings::default(),
        }
    }

    /// Creates an HTTP client from connection-level settings.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Client`] if reqwest rejects the settings
    /// (e.g. a `User-Agent` that is not a valid header value).
    pub fn with_settings(settings: ClientSettings) -> Result<Self, HttpError> {
        let inner = build_client(&settings, settings.open_timeout)?;
        Ok(Self { inner, settings })
    }

    /// Returns the connection-level settings.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Returns a client honoring the requested open timeout.
    ///
    /// reqwest only supports connect timeouts per client, so a request
    /// asking for a different one gets a dedicated client.
    fn client_for(&self, open_timeout: Option<Duration>) -> Result<reqwest::Client, HttpError> {
        match open_timeout {
            Some(timeout) if Some(timeout) != self.settings.open_timeout => {
                build_client(&self.settings, Some(timeout))
            }
            _ => Ok(self.inner.clone()),
        }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(
    settings: &ClientSettings,
    open_timeout: Option<Duration>,
) -> Result<reqwest::Client, HttpError> {
    let mut builder =
        reqwest::Client::builder().danger_accept_invalid_certs(settings.disable_ssl_verification);

    if let Some(ref agent) = settings.user_agent {
        builder = builder.user_agent(agent.as_str());
    }
    if let Some(timeout) = open_timeout {
        builder = builder.connect_timeout(timeout);
    }

    builder.build().map_err(|e| HttpError::Client(e.to_string()))
}

fn multipart_form(parts: Vec<Part>) -> Result<Form, HttpError> {
    let mut form = Form::new();
    for part in parts {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::File(file) => {
                let mut file_part = ReqwestPart::bytes(file.bytes).file_name(file.filename);
                if let Some(ref mime) = file.content_type {
                    file_part = file_part
                        .mime_str(mime)
                        .map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
                }
                form.part(part.name, file_part)
            }
        };
    }
    Ok(form)
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = req.full_url();
        let client = self.client_for(req.options.open_timeout)?;
        let mut builder = client.request(req.method, url.as_str());

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(ref auth) = self.settings.basic_auth {
            if !req.headers.contains_key(http::header::AUTHORIZATION) {
                builder = builder.basic_auth(&auth.username, Some(&auth.password));
            }
        }

        if let Some(timeout) = req.options.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match req.body {
            Body::Empty => builder,
            Body::Text(text) => builder.body(text),
            Body::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(&pairs)
                    .map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
                if !req.headers.contains_key(CONTENT_TYPE) {
                    builder = builder.header(
                        CONTENT_TYPE,
                        HeaderValue::from_static("application/x-www-form-urlencoded"),
                    );
                }
                builder.body(encoded)
            }
            Body::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else if e.is_builder() {
                HttpError::InvalidUrl(e.to_string())
            } else {
                HttpError::Connection(Box::new(e))
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::Connection(Box::new(e))
                }
            })?
            .to_vec();

        let response = HttpResponse::new(status, headers, body);
        if self.settings.fail_on_status && !response.is_success() {
            return Err(HttpError::Status {
                status,
                body: response.body_text(),
            });
        }

        Ok(response)
    }
}
