//! Cross-field validation of the raw agent options.
//!
//! Checks run against option shapes only; templates are never rendered
//! here. Every rule runs, so one pass reports every problem.

use serde_json::Value;

use super::error::ValidationError;
use super::options::{AgentOptions, is_present, key, parse_boolish};
use crate::request::{HeaderStyle, HttpVerb, looks_like_mime};
use crate::template::{is_template, value_to_text};

/// Validates `options`, returning every violation found (empty when valid).
#[must_use]
pub fn validate(options: &AgentOptions) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_endpoint(options, &mut errors);
    check_payload(options, &mut errors);
    check_flags(options, &mut errors);
    check_output_mode(options, &mut errors);
    check_method(options, &mut errors);
    check_headers(options, &mut errors);
    check_event_headers(options, &mut errors);
    check_web_request(options, &mut errors);

    errors
}

/// The configured method, lowercased, defaulting to `post`.
///
/// Template expressions are returned unrendered.
#[must_use]
pub fn raw_method(options: &AgentOptions) -> String {
    options
        .get(key::METHOD)
        .filter(|v| is_present(v))
        .map_or_else(|| HttpVerb::Post.as_str().to_string(), value_to_text)
        .to_lowercase()
}

fn is_collection(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn check_endpoint(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    if !options.is_present(key::ENDPOINT) {
        errors.push(ValidationError::MissingEndpoint);
    }
}

fn check_payload(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    let payload = options.value(key::PAYLOAD);
    let present = is_present(&payload);
    let mime = options.str(key::CONTENT_TYPE).is_some_and(looks_like_mime);
    let verb = raw_method(options).parse::<HttpVerb>().ok();

    if present && !is_collection(&payload) {
        match verb {
            Some(HttpVerb::Get | HttpVerb::Delete) => {
                errors.push(ValidationError::PayloadNotCollection);
            }
            Some(v) if v.has_body() && !mime => {
                errors.push(ValidationError::PayloadNeedsMimeType);
            }
            _ => {}
        }
    }

    if mime
        && payload.is_string()
        && options.get(key::NO_MERGE).and_then(|v| parse_boolish(v).ok()) != Some(true)
    {
        errors.push(ValidationError::StringPayloadMerged);
    }

    if options.str(key::CONTENT_TYPE) == Some("form") && present && payload.is_array() {
        errors.push(ValidationError::FormPayloadNotMap);
    }
}

fn check_flags(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    for flag in [key::EMIT_EVENTS, key::LOG_REQUESTS] {
        if options.has_key(flag) && parse_boolish(&options.value(flag)).is_err() {
            errors.push(ValidationError::NotBoolean(flag));
        }
    }

    for flag in [key::NO_MERGE, key::DISABLE_SSL_VERIFICATION] {
        if options.is_present(flag) && parse_boolish(&options.value(flag)).is_err() {
            errors.push(ValidationError::NotBoolean(flag));
        }
    }
}

fn check_output_mode(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    if !options.is_present(key::OUTPUT_MODE) {
        return;
    }
    let mode = value_to_text(&options.value(key::OUTPUT_MODE));
    if !mode.contains('{') && mode != "clean" && mode != "merge" {
        errors.push(ValidationError::InvalidOutputMode);
    }
}

fn check_method(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    let method = raw_method(options);
    if !is_template(&method) && method.parse::<HttpVerb>().is_err() {
        errors.push(ValidationError::InvalidMethod);
    }
}

fn check_headers(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    if options.is_present(key::HEADERS) && !options.value(key::HEADERS).is_object() {
        errors.push(ValidationError::HeadersNotMap);
    }
}

fn check_event_headers(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    if let Some(value) = options.get(key::EVENT_HEADERS).filter(|v| is_present(v)) {
        let valid = match value {
            Value::String(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        };
        if !valid {
            errors.push(ValidationError::InvalidEventHeaders);
        }
    }

    if let Some(value) = options.get(key::EVENT_HEADERS_STYLE).filter(|v| is_present(v)) {
        let valid = value
            .as_str()
            .is_some_and(|s| is_template(s) || s.parse::<HeaderStyle>().is_ok());
        if !valid {
            errors.push(ValidationError::InvalidEventHeadersStyle);
        }
    }

    if options.is_present(key::EVENT_HEADERS_KEY) && options.str(key::EVENT_HEADERS_KEY).is_none()
    {
        errors.push(ValidationError::InvalidEventHeadersKey);
    }
}

fn check_web_request(options: &AgentOptions, errors: &mut Vec<ValidationError>) {
    if let Some(value) = options.get(key::BASIC_AUTH).filter(|v| is_present(v)) {
        let valid = match value {
            Value::String(s) => s.contains(':'),
            Value::Array(items) => items.len() == 2 && items.iter().all(Value::is_string),
            _ => false,
        };
        if !valid {
            errors.push(ValidationError::InvalidBasicAuth);
        }
    }

    if options.is_present(key::USER_AGENT) && options.str(key::USER_AGENT).is_none() {
        errors.push(ValidationError::InvalidUserAgent);
    }

    for name in [key::TIMEOUT, key::OPEN_TIMEOUT] {
        if let Some(value) = options.get(name).filter(|v| is_present(v)) {
            let valid = match value {
                Value::Number(n) => n.is_u64(),
                Value::String(s) => is_template(s) || s.trim().parse::<u64>().is_ok(),
                _ => false,
            };
            if !valid {
                errors.push(ValidationError::InvalidTimeout(name));
            }
        }
    }
}
