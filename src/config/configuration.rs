//! The validated, immutable agent configuration.
//!
//! [`Configuration`] is built once from the raw option bag. Templated
//! fields stay raw and are rendered per handling cycle by
//! [`Configuration::resolve`] into a [`ResolvedOptions`] snapshot, so nothing
//! is read ad hoc while a request is in flight.

use std::time::Duration;

use serde_json::{Map, Value};

use super::defaults;
use super::error::ConfigError;
use super::options::{AgentOptions, is_present, key, parse_boolish};
use super::validate::validate;
use crate::request::{ContentType, HeaderStyle};
use crate::template::{TemplateError, TemplateResolver, is_template, value_to_text};
use crate::transport::{BasicAuth, ClientSettings, RequestOptions};

/// Whether output events start from the triggering event's fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Output events contain only response fields.
    #[default]
    Clean,
    /// Output events start as a copy of the triggering event.
    Merge,
}

/// Agent options rendered for one handling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// Target URL text
    pub endpoint: String,
    /// Lowercased method name (may still be unsupported)
    pub method: String,
    /// Selected encoding
    pub content_type: ContentType,
    /// Rendered payload, `{}` when absent or blank
    pub payload: Value,
    /// Rendered `headers` option (null when absent)
    pub headers: Value,
    /// Send the payload without merging event fields
    pub no_merge: bool,
    /// Shape of emitted events
    pub output_mode: OutputMode,
    /// Emit response/error events
    pub emit_events: bool,
    /// Log each outgoing request
    pub log_requests: bool,
    /// Multipart field name for attached files
    pub upload_key: String,
    /// XML root element name
    pub xml_root: String,
    /// Per-request timeouts
    pub request_options: RequestOptions,
    /// Response header key style
    pub header_style: HeaderStyle,
}

/// The agent configuration, validated at construction.
#[derive(Debug, Clone)]
pub struct Configuration {
    options: AgentOptions,
    basic_auth: Option<BasicAuth>,
    user_agent: Option<String>,
    disable_ssl_verification: bool,
    open_timeout: Option<Duration>,
    event_headers: Option<Vec<String>>,
    event_headers_key: String,
}

impl Configuration {
    /// Validates `options` and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every validation failure.
    pub fn from_options(options: AgentOptions) -> Result<Self, ConfigError> {
        let errors = validate(&options);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let basic_auth = options.get(key::BASIC_AUTH).and_then(parse_basic_auth);
        let user_agent = options
            .str(key::USER_AGENT)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let disable_ssl_verification = options
            .get(key::DISABLE_SSL_VERIFICATION)
            .is_some_and(|v| parse_boolish(v) == Ok(true));
        let open_timeout = options.get(key::OPEN_TIMEOUT).and_then(parse_seconds);
        let event_headers = options.get(key::EVENT_HEADERS).and_then(parse_header_list);
        let event_headers_key = options
            .str(key::EVENT_HEADERS_KEY)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults::EVENT_HEADERS_KEY)
            .to_string();

        Ok(Self {
            options,
            basic_auth,
            user_agent,
            disable_ssl_verification,
            open_timeout,
            event_headers,
            event_headers_key,
        })
    }

    /// The raw option bag.
    #[must_use]
    pub const fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// The un-rendered `payload` option, for failure reports.
    #[must_use]
    pub fn raw_payload(&self) -> Value {
        self.options.value(key::PAYLOAD)
    }

    /// The un-rendered `endpoint` option.
    #[must_use]
    pub fn raw_endpoint(&self) -> String {
        value_to_text(&self.options.value(key::ENDPOINT))
    }

    /// Whether events are emitted, judged without rendering any template.
    ///
    /// Used when rendering itself failed.
    #[must_use]
    pub fn emits_events_unrendered(&self) -> bool {
        flag(self.options.as_map(), key::EMIT_EVENTS)
    }

    /// The output mode, judged without rendering any template.
    ///
    /// Only a literal `merge` selects [`OutputMode::Merge`].
    #[must_use]
    pub fn output_mode_unrendered(&self) -> OutputMode {
        if self.options.str(key::OUTPUT_MODE) == Some("merge") {
            OutputMode::Merge
        } else {
            OutputMode::Clean
        }
    }

    /// Response headers to keep, or `None` to keep all.
    #[must_use]
    pub fn event_headers(&self) -> Option<&[String]> {
        self.event_headers.as_deref()
    }

    /// Output-event key that holds the response headers.
    #[must_use]
    pub fn event_headers_key(&self) -> &str {
        &self.event_headers_key
    }

    /// Configured basic auth credentials.
    #[must_use]
    pub const fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    /// Transport settings derived from the connection-level options.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            user_agent: self.user_agent.clone(),
            disable_ssl_verification: self.disable_ssl_verification,
            basic_auth: self.basic_auth.clone(),
            open_timeout: self.open_timeout,
            fail_on_status: false,
        }
    }

    /// Renders every option against `context` (an event payload, or empty
    /// for scheduled checks).
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if any option holds a malformed template.
    pub fn resolve<R: TemplateResolver + ?Sized>(
        &self,
        resolver: &R,
        context: &Map<String, Value>,
    ) -> Result<ResolvedOptions, TemplateError> {
        let rendered = resolver.resolve(&Value::Object(self.options.as_map().clone()), context)?;
        let map = match rendered {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let present = |name: &str| map.get(name).filter(|v| is_present(v));
        let text_or = |name: &str, default: &str| {
            present(name).map_or_else(|| default.to_string(), value_to_text)
        };

        let header_style = match present(key::EVENT_HEADERS_STYLE) {
            None => HeaderStyle::default(),
            Some(value) => value_to_text(value).parse::<HeaderStyle>().unwrap_or_else(|style| {
                tracing::warn!("Unknown event_headers_style '{style}', using capitalized");
                HeaderStyle::default()
            }),
        };

        let output_mode = if map.get(key::OUTPUT_MODE).map(value_to_text).as_deref() == Some("merge")
        {
            OutputMode::Merge
        } else {
            OutputMode::Clean
        };

        Ok(ResolvedOptions {
            endpoint: value_to_text(map.get(key::ENDPOINT).unwrap_or(&Value::Null)),
            method: text_or(key::METHOD, defaults::METHOD).to_lowercase(),
            content_type: ContentType::parse(map.get(key::CONTENT_TYPE).and_then(Value::as_str)),
            payload: present(key::PAYLOAD)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            headers: present(key::HEADERS).cloned().unwrap_or(Value::Null),
            no_merge: flag(&map, key::NO_MERGE),
            output_mode,
            emit_events: flag(&map, key::EMIT_EVENTS),
            log_requests: flag(&map, key::LOG_REQUESTS),
            upload_key: text_or(key::UPLOAD_KEY, defaults::UPLOAD_KEY),
            xml_root: text_or(key::XML_ROOT, defaults::XML_ROOT),
            request_options: RequestOptions {
                timeout: map.get(key::TIMEOUT).and_then(parse_seconds),
                open_timeout: map.get(key::OPEN_TIMEOUT).and_then(parse_seconds),
            },
            header_style,
        })
    }
}

fn flag(map: &Map<String, Value>, name: &str) -> bool {
    map.get(name).is_some_and(|v| parse_boolish(v) == Ok(true))
}

/// Whole seconds from a number or numeric string; zero means no limit.
fn parse_seconds(value: &Value) -> Option<Duration> {
    let secs = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !is_template(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (secs > 0).then_some(Duration::from_secs(secs))
}

fn parse_basic_auth(value: &Value) -> Option<BasicAuth> {
    let (username, password) = match value {
        Value::String(s) => s.split_once(':')?,
        Value::Array(items) => match items.as_slice() {
            [Value::String(user), Value::String(pass)] => (user.as_str(), pass.as_str()),
            _ => return None,
        },
        _ => return None,
    };
    Some(BasicAuth {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn parse_header_list(value: &Value) -> Option<Vec<String>> {
    let names: Vec<String> = match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    (!names.is_empty()).then_some(names)
}
