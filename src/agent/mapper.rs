//! Mapping of request outcomes into output event payloads.
//!
//! Success and failure share one base: a copy of the triggering event's
//! fields in [`OutputMode::Merge`], or an empty map otherwise. Response
//! fields are layered on top and overwrite same-named event fields.

use serde_json::{Map, Value};

use crate::config::OutputMode;
use crate::event::Event;
use crate::request::{HeaderStyle, normalize_response_headers};
use crate::transport::HttpResponse;

/// How response headers are presented in success events.
#[derive(Debug, Clone, Copy)]
pub struct HeaderView<'a> {
    /// Key style
    pub style: HeaderStyle,
    /// Headers to keep (all when `None`)
    pub allowlist: Option<&'a [String]>,
    /// Output-event key holding the headers
    pub key: &'a str,
}

/// The facts reported for a failed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    /// Carried HTTP status, or 500
    pub status: u16,
    /// Human-readable failure message
    pub error_message: String,
    /// Endpoint the request was aimed at
    pub endpoint: String,
    /// The payload option exactly as configured, templates unrendered
    pub payload_options: Value,
}

impl FailureReport {
    /// The diagnostic record written for every failure.
    #[must_use]
    pub fn log_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("error_message".to_string(), self.error_message.clone().into());
        record.insert("status_code".to_string(), self.status.into());
        record.insert("endpoint".to_string(), self.endpoint.clone().into());
        record.insert("payload_options".to_string(), self.payload_options.clone());
        record
    }
}

/// The starting payload for output events.
#[must_use]
pub fn base_payload(mode: OutputMode, event: Option<&Event>) -> Map<String, Value> {
    match (mode, event) {
        (OutputMode::Merge, Some(event)) => event.payload.clone(),
        _ => Map::new(),
    }
}

/// `base` + `{body, status}` + `{<key>: normalized headers}`.
#[must_use]
pub fn success_payload(
    mut base: Map<String, Value>,
    response: &HttpResponse,
    view: HeaderView<'_>,
) -> Map<String, Value> {
    base.insert("body".to_string(), Value::String(response.body_text()));
    base.insert("status".to_string(), response.status.as_u16().into());
    base.insert(
        view.key.to_string(),
        Value::Object(normalize_response_headers(
            &response.headers,
            view.style,
            view.allowlist,
        )),
    );
    base
}

/// `base` + `{status, error_message, endpoint, payload_options}`.
#[must_use]
pub fn failure_payload(mut base: Map<String, Value>, report: &FailureReport) -> Map<String, Value> {
    base.insert("status".to_string(), report.status.into());
    base.insert("error_message".to_string(), report.error_message.clone().into());
    base.insert("endpoint".to_string(), report.endpoint.clone().into());
    base.insert("payload_options".to_string(), report.payload_options.clone());
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn event(payload: Value) -> Event {
        match payload {
            Value::Object(map) => Event::new(map),
            other => panic!("expected a map, got {other}"),
        }
    }

    fn response() -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/html"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        HttpResponse::new(http::StatusCode::OK, headers, b"<html></html>".to_vec())
    }

    const VIEW: HeaderView<'static> = HeaderView {
        style: HeaderStyle::Capitalized,
        allowlist: None,
        key: "headers",
    };

    fn report() -> FailureReport {
        FailureReport {
            status: 500,
            error_message: "Connection error: refused".to_string(),
            endpoint: "http://x".to_string(),
            payload_options: json!({"a": "{{ secret }}"}),
        }
    }

    mod base {
        use super::*;

        #[test]
        fn merge_copies_event_fields() {
            let event = event(json!({"id": 1}));

            assert_eq!(
                Value::Object(base_payload(OutputMode::Merge, Some(&event))),
                json!({"id": 1})
            );
        }

        #[test]
        fn clean_starts_empty() {
            let event = event(json!({"id": 1}));

            assert!(base_payload(OutputMode::Clean, Some(&event)).is_empty());
        }

        #[test]
        fn merge_without_event_starts_empty() {
            assert!(base_payload(OutputMode::Merge, None).is_empty());
        }
    }

    mod success {
        use super::*;

        #[test]
        fn clean_payload_has_exactly_body_status_headers() {
            let payload = success_payload(Map::new(), &response(), VIEW);

            assert_eq!(
                Value::Object(payload),
                json!({
                    "body": "<html></html>",
                    "status": 200,
                    "headers": {"Content-Type": "text/html", "X-Trace": "abc"}
                })
            );
        }

        #[test]
        fn response_fields_overwrite_event_fields() {
            let base = base_payload(
                OutputMode::Merge,
                Some(&event(json!({"status": "queued", "id": 9}))),
            );

            let payload = success_payload(base, &response(), VIEW);

            assert_eq!(payload["status"], json!(200));
            assert_eq!(payload["id"], json!(9));
        }

        #[test]
        fn allowlist_style_and_key_are_applied() {
            let allow = vec!["content-type".to_string()];
            let view = HeaderView {
                style: HeaderStyle::Snakecased,
                allowlist: Some(&allow),
                key: "response_headers",
            };

            let payload = success_payload(Map::new(), &response(), view);

            assert_eq!(payload["response_headers"], json!({"content_type": "text/html"}));
            assert!(!payload.contains_key("headers"));
        }
    }

    mod failure {
        use super::*;

        #[test]
        fn payload_carries_report_fields() {
            let payload = failure_payload(Map::new(), &report());

            assert_eq!(
                Value::Object(payload),
                json!({
                    "status": 500,
                    "error_message": "Connection error: refused",
                    "endpoint": "http://x",
                    "payload_options": {"a": "{{ secret }}"}
                })
            );
        }

        #[test]
        fn merge_keeps_event_fields() {
            let base = base_payload(OutputMode::Merge, Some(&event(json!({"id": 3}))));

            let payload = failure_payload(base, &report());

            assert_eq!(payload["id"], json!(3));
            assert_eq!(payload["status"], json!(500));
        }

        #[test]
        fn log_record_uses_status_code_key() {
            let record = report().log_record();

            assert_eq!(
                Value::Object(record),
                json!({
                    "error_message": "Connection error: refused",
                    "status_code": 500,
                    "endpoint": "http://x",
                    "payload_options": {"a": "{{ secret }}"}
                })
            );
        }
    }
}
