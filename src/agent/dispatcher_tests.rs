//! Tests for `Dispatcher`.

use std::sync::{Arc, Mutex};

use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value, json};

use super::dispatcher::{CycleOutcome, Dispatcher};
use super::sink::{EventSink, RecordLog};
use crate::config::{AgentOptions, Configuration};
use crate::event::{Event, FileError, FilePointer, FileProvider};
use crate::transport::{
    Body, HttpClient, HttpError, HttpRequest, HttpResponse, PartValue, UploadFile,
};

/// Mock HTTP client that returns a configurable sequence of responses.
#[derive(Debug)]
struct MockClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn html(count: usize) -> Arc<Self> {
        Self::new((0..count).map(|_| Ok(html_response())).collect())
    }

    fn failing(error: HttpError) -> Arc<Self> {
        Self::new(vec![Err(error)])
    }

    fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for Arc<MockClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(req);
        self.responses.lock().unwrap().remove(0)
    }
}

/// Collects emitted events.
#[derive(Debug, Default)]
struct MockSink {
    events: Mutex<Vec<Map<String, Value>>>,
}

impl MockSink {
    fn emitted(&self) -> Vec<Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }
}

impl EventSink for Arc<MockSink> {
    fn emit(&self, payload: Map<String, Value>) {
        self.events.lock().unwrap().push(payload);
    }
}

/// Collects diagnostic records.
#[derive(Debug, Default)]
struct MockLog {
    records: Mutex<Vec<Map<String, Value>>>,
}

impl MockLog {
    fn records(&self) -> Vec<Value> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }
}

impl RecordLog for Arc<MockLog> {
    fn log(&self, record: Map<String, Value>) {
        self.records.lock().unwrap().push(record);
    }
}

/// Serves a fixed upload and counts how often it was asked.
#[derive(Debug, Default)]
struct MockFiles {
    opened: Mutex<Vec<FilePointer>>,
}

impl FileProvider for Arc<MockFiles> {
    async fn open(&self, pointer: &FilePointer) -> Result<UploadFile, FileError> {
        self.opened.lock().unwrap().push(pointer.clone());
        Ok(UploadFile {
            filename: "report.csv".to_string(),
            content_type: pointer.content_type.clone(),
            bytes: b"a,b\n1,2\n".to_vec(),
        })
    }
}

struct Harness {
    client: Arc<MockClient>,
    sink: Arc<MockSink>,
    log: Arc<MockLog>,
    files: Arc<MockFiles>,
    dispatcher: Dispatcher<
        Arc<MockClient>,
        Arc<MockSink>,
        crate::template::HandlebarsResolver,
        Arc<MockFiles>,
        Arc<MockLog>,
    >,
}

fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a map, got {other}"),
    }
}

fn harness(options: Value, client: Arc<MockClient>) -> Harness {
    let config = Configuration::from_options(AgentOptions::new(map(options))).unwrap();
    let sink = Arc::new(MockSink::default());
    let log = Arc::new(MockLog::default());
    let files = Arc::new(MockFiles::default());
    let dispatcher = Dispatcher::new(config, Arc::clone(&client), Arc::clone(&sink))
        .with_log(Arc::clone(&log))
        .with_file_provider(Arc::clone(&files));
    Harness {
        client,
        sink,
        log,
        files,
        dispatcher,
    }
}

fn html_response() -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    HttpResponse::new(http::StatusCode::OK, headers, b"<html></html>".to_vec())
}

fn event(payload: Value) -> Event {
    Event::new(map(payload))
}

fn json_body(request: &HttpRequest) -> Value {
    match &request.body {
        Body::Text(text) => serde_json::from_str(text).unwrap(),
        other => panic!("expected a text body, got {other:?}"),
    }
}

mod success {
    use super::*;

    #[tokio::test]
    async fn clean_event_has_exactly_status_headers_body() {
        let h = harness(
            json!({"endpoint": "http://example.com", "emit_events": "true"}),
            MockClient::html(1),
        );

        let outcome = h.dispatcher.receive(&event(json!({"a": 1}))).await;

        assert_eq!(outcome, CycleOutcome::Responded { status: 200 });
        assert_eq!(
            h.sink.emitted(),
            vec![json!({
                "status": 200,
                "headers": {"Content-Type": "text/html"},
                "body": "<html></html>"
            })]
        );
    }

    #[tokio::test]
    async fn merge_mode_starts_from_event_fields() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "emit_events": true,
                "output_mode": "merge"
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"id": 7, "status": "new"}))).await;

        let emitted = h.sink.emitted();
        assert_eq!(emitted[0]["id"], json!(7));
        assert_eq!(emitted[0]["status"], json!(200));
    }

    #[tokio::test]
    async fn no_event_without_emit_events() {
        let h = harness(json!({"endpoint": "http://example.com"}), MockClient::html(1));

        let outcome = h.dispatcher.receive(&event(json!({}))).await;

        assert!(outcome.is_responded());
        assert!(h.sink.emitted().is_empty());
        assert!(h.log.records().is_empty());
    }

    #[tokio::test]
    async fn header_options_shape_the_headers_field() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "emit_events": "true",
                "event_headers": ["content-type", "x-missing"],
                "event_headers_style": "downcased",
                "event_headers_key": "response_headers"
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({}))).await;

        let emitted = h.sink.emitted();
        assert_eq!(emitted[0]["response_headers"], json!({"content-type": "text/html"}));
        assert!(emitted[0].get("headers").is_none());
    }

    #[tokio::test]
    async fn log_requests_records_the_outgoing_request() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/hook",
                "content_type": "json",
                "payload": {"a": "b"},
                "no_merge": "true",
                "log_requests": "true"
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"ignored": true}))).await;

        let records = h.log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["method"], json!("post"));
        assert_eq!(records[0]["url"], json!("http://example.com/hook"));
        assert_eq!(records[0]["body"], json!(r#"{"a":"b"}"#));
        assert_eq!(
            records[0]["headers"]["Content-Type"],
            json!("application/json; charset=utf-8")
        );
    }
}

mod failure {
    use super::*;

    #[tokio::test]
    async fn connection_failure_reports_500_with_raw_payload() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/{{ path }}",
                "payload": {"token": "{{ secret }}"},
                "emit_events": "true"
            }),
            MockClient::failing(HttpError::Connection("connection refused".into())),
        );

        let outcome = h
            .dispatcher
            .receive(&event(json!({"path": "p", "secret": "s3cret"})))
            .await;

        assert!(matches!(outcome, CycleOutcome::Failed { status: 500, .. }));
        assert_eq!(
            h.sink.emitted(),
            vec![json!({
                "status": 500,
                "error_message": "Connection error: connection refused",
                "endpoint": "http://example.com/p",
                "payload_options": {"token": "{{ secret }}"}
            })]
        );
        assert_eq!(
            h.log.records(),
            vec![json!({
                "error_message": "Connection error: connection refused",
                "status_code": 500,
                "endpoint": "http://example.com/p",
                "payload_options": {"token": "{{ secret }}"}
            })]
        );
    }

    #[tokio::test]
    async fn carried_status_is_reported() {
        let h = harness(
            json!({"endpoint": "http://example.com", "emit_events": "true"}),
            MockClient::failing(HttpError::Status {
                status: http::StatusCode::NOT_FOUND,
                body: "missing".to_string(),
            }),
        );

        let outcome = h.dispatcher.receive(&event(json!({}))).await;

        assert!(matches!(outcome, CycleOutcome::Failed { status: 404, .. }));
        assert_eq!(h.sink.emitted()[0]["status"], json!(404));
    }

    #[tokio::test]
    async fn failure_is_logged_even_without_emit_events() {
        let h = harness(
            json!({"endpoint": "http://example.com"}),
            MockClient::failing(HttpError::Timeout),
        );

        h.dispatcher.receive(&event(json!({}))).await;

        assert!(h.sink.emitted().is_empty());
        assert_eq!(h.log.records()[0]["status_code"], json!(500));
        assert_eq!(h.log.records()[0]["error_message"], json!("Request timed out"));
    }

    #[tokio::test]
    async fn merge_mode_failure_keeps_event_fields() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "emit_events": "true",
                "output_mode": "merge"
            }),
            MockClient::failing(HttpError::Timeout),
        );

        h.dispatcher.receive(&event(json!({"id": 4}))).await;

        assert_eq!(h.sink.emitted()[0]["id"], json!(4));
        assert_eq!(h.sink.emitted()[0]["status"], json!(500));
    }

    #[tokio::test]
    async fn unsupported_rendered_method_never_sends() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "method": "{{ verb }}",
                "emit_events": "true"
            }),
            MockClient::new(vec![]),
        );

        let outcome = h.dispatcher.receive(&event(json!({"verb": "head"}))).await;

        assert_eq!(
            outcome,
            CycleOutcome::Failed {
                status: 500,
                message: "Invalid method 'head'".to_string()
            }
        );
        assert!(h.client.captured_requests().is_empty());
        assert_eq!(h.sink.emitted()[0]["error_message"], json!("Invalid method 'head'"));
    }

    #[tokio::test]
    async fn malformed_template_fails_with_raw_endpoint() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/{{#if id}}x{{/each}}",
                "emit_events": "true"
            }),
            MockClient::new(vec![]),
        );

        let outcome = h.dispatcher.receive(&event(json!({"id": 1}))).await;

        assert!(matches!(outcome, CycleOutcome::Failed { status: 500, .. }));
        assert!(h.client.captured_requests().is_empty());
        let emitted = h.sink.emitted();
        assert_eq!(emitted[0]["endpoint"], json!("http://example.com/{{#if id}}x{{/each}}"));
        assert_eq!(emitted[0]["payload_options"], Value::Null);
        assert!(emitted[0].get("id").is_none());
    }

    #[tokio::test]
    async fn malformed_template_in_merge_mode_keeps_event_fields() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/{{#if id}}x{{/each}}",
                "emit_events": "true",
                "output_mode": "merge"
            }),
            MockClient::new(vec![]),
        );

        h.dispatcher.receive(&event(json!({"id": 1, "keep": "me"}))).await;

        let emitted = h.sink.emitted();
        assert_eq!(emitted[0]["id"], json!(1));
        assert_eq!(emitted[0]["keep"], json!("me"));
        assert_eq!(emitted[0]["status"], json!(500));
    }

    #[tokio::test]
    async fn get_json_failure_reports_the_folded_url() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/search",
                "method": "get",
                "content_type": "json",
                "payload": {"q": "rust"},
                "no_merge": "true",
                "emit_events": "true"
            }),
            MockClient::failing(HttpError::Timeout),
        );

        h.dispatcher.receive(&event(json!({}))).await;

        let sent = h.client.captured_requests()[0].url.to_string();
        assert_eq!(sent, "http://example.com/search?q=rust");
        assert_eq!(h.sink.emitted()[0]["endpoint"], json!(sent));
        assert_eq!(h.log.records()[0]["endpoint"], json!(sent));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_later_events() {
        let h = harness(
            json!({"endpoint": "http://example.com", "emit_events": "true"}),
            MockClient::new(vec![Err(HttpError::Timeout), Ok(html_response())]),
        );

        let outcomes = h
            .dispatcher
            .on_events(&[event(json!({"n": 1})), event(json!({"n": 2}))])
            .await;

        assert!(!outcomes[0].is_responded());
        assert!(outcomes[1].is_responded());
        assert_eq!(h.sink.emitted().len(), 2);
    }
}

mod working_data {
    use super::*;

    #[tokio::test]
    async fn payload_overrides_event_fields() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "content_type": "json",
                "payload": {"x": 2}
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"x": 1, "y": 3}))).await;

        let requests = h.client.captured_requests();
        assert_eq!(json_body(&requests[0]), json!({"x": 2, "y": 3}));
    }

    #[tokio::test]
    async fn no_merge_sends_payload_alone() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "content_type": "json",
                "payload": {"x": "{{ x }}"},
                "no_merge": true
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"x": 1, "y": 3}))).await;

        assert_eq!(json_body(&h.client.captured_requests()[0]), json!({"x": "1"}));
    }

    #[tokio::test]
    async fn string_payload_is_sent_verbatim() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "content_type": "text/plain",
                "payload": "hello {{ name }}",
                "no_merge": "true"
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"name": "world"}))).await;

        let request = &h.client.captured_requests()[0];
        assert_eq!(request.body, Body::Text("hello world".to_string()));
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[tokio::test]
    async fn get_json_folds_data_into_the_url() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/search",
                "method": "get",
                "content_type": "json",
                "payload": {"q": "{{ term }}", "empty": ""}
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"term": "rust"}))).await;

        let request = &h.client.captured_requests()[0];
        let query: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        assert!(query.contains(&("q".to_string(), "rust".to_string())));
        assert!(query.contains(&("term".to_string(), "rust".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "empty"));
        assert_eq!(request.method, http::Method::GET);
        assert!(request.body.is_empty());
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn delete_sends_params() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/items",
                "method": "delete",
                "payload": {"id": "{{ id }}"},
                "no_merge": true
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"id": 12}))).await;

        let request = &h.client.captured_requests()[0];
        assert_eq!(request.method, http::Method::DELETE);
        assert_eq!(request.params, vec![("id".to_string(), "12".to_string())]);
    }

    #[tokio::test]
    async fn headers_and_timeouts_are_passed_through() {
        let h = harness(
            json!({
                "endpoint": "http://example.com",
                "headers": {"X-Request-Id": "{{ rid }}"},
                "timeout": 7
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&event(json!({"rid": "r-1"}))).await;

        let request = &h.client.captured_requests()[0];
        assert_eq!(request.headers.get("x-request-id").unwrap(), "r-1");
        assert_eq!(
            request.options.timeout,
            Some(std::time::Duration::from_secs(7))
        );
    }
}

mod files {
    use super::*;

    fn with_file(payload: Value) -> Event {
        event(payload).with_file_pointer(FilePointer {
            file: "/tmp/report.csv".to_string(),
            content_type: Some("text/csv".to_string()),
        })
    }

    #[tokio::test]
    async fn file_pointer_becomes_multipart_upload() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/upload",
                "content_type": "json",
                "payload": {"title": "{{ title }}"},
                "no_merge": true,
                "upload_key": "document"
            }),
            MockClient::html(1),
        );

        h.dispatcher.receive(&with_file(json!({"title": "Q3"}))).await;

        let request = &h.client.captured_requests()[0];
        let Body::Multipart(parts) = &request.body else {
            panic!("expected multipart, got {:?}", request.body);
        };
        assert_eq!(parts[0].name, "title");
        assert_eq!(parts[0].value, PartValue::Text("Q3".to_string()));
        assert_eq!(parts[1].name, "document");
        assert!(matches!(&parts[1].value, PartValue::File(f) if f.filename == "report.csv"));
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn get_requests_ignore_file_pointers() {
        let h = harness(
            json!({"endpoint": "http://example.com", "method": "get"}),
            MockClient::html(1),
        );

        h.dispatcher.receive(&with_file(json!({}))).await;

        assert!(h.files.opened.lock().unwrap().is_empty());
        assert!(h.client.captured_requests()[0].body.is_empty());
    }
}

mod ordering {
    use super::*;

    #[tokio::test]
    async fn events_are_sent_in_order() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/{{ n }}",
                "emit_events": "true",
                "output_mode": "merge"
            }),
            MockClient::html(3),
        );

        let events: Vec<Event> = (1..=3).map(|n| event(json!({"n": n}))).collect();
        let outcomes = h.dispatcher.on_events(&events).await;

        assert_eq!(outcomes.len(), 3);
        let urls: Vec<String> = h
            .client
            .captured_requests()
            .iter()
            .map(|r| r.url.to_string())
            .collect();
        assert_eq!(
            urls,
            vec![
                "http://example.com/1",
                "http://example.com/2",
                "http://example.com/3"
            ]
        );
        let ns: Vec<Value> = h.sink.emitted().iter().map(|e| e["n"].clone()).collect();
        assert_eq!(ns, vec![json!(1), json!(2), json!(3)]);
    }
}

mod schedule {
    use super::*;

    #[tokio::test]
    async fn scheduled_check_sends_payload_without_event() {
        let h = harness(
            json!({
                "endpoint": "http://example.com/ping",
                "content_type": "json",
                "payload": {"source": "schedule", "who": "{{ name }}"},
                "emit_events": "true",
                "output_mode": "merge"
            }),
            MockClient::html(1),
        );

        let outcome = h.dispatcher.on_schedule().await;

        assert!(outcome.is_responded());
        assert_eq!(
            json_body(&h.client.captured_requests()[0]),
            json!({"source": "schedule", "who": ""})
        );
        let emitted = h.sink.emitted();
        assert_eq!(emitted[0].as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn scheduled_check_without_payload_sends_empty_map() {
        let h = harness(
            json!({"endpoint": "http://example.com", "content_type": "json"}),
            MockClient::html(1),
        );

        h.dispatcher.on_schedule().await;

        assert_eq!(json_body(&h.client.captured_requests()[0]), json!({}));
    }
}
