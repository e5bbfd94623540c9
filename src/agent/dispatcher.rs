//! The dispatcher: one handling cycle per triggering input.

use serde_json::{Map, Value};

use crate::config::{Configuration, ResolvedOptions};
use crate::event::{Event, FileProvider, FsFileProvider};
use crate::request::{Encoding, HttpVerb, OutgoingRequest, build, build_headers};
use crate::template::{HandlebarsResolver, TemplateResolver};
use crate::transport::HttpClient;

use super::error::CycleError;
use super::mapper::{self, FailureReport, HeaderView};
use super::sink::{EventSink, RecordLog, TracingLog};

/// The result of one handling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The endpoint answered (any status the transport accepted).
    Responded {
        /// Response status
        status: u16,
    },
    /// The cycle failed before or during the request.
    Failed {
        /// Carried HTTP status, or 500
        status: u16,
        /// Failure message
        message: String,
    },
}

impl CycleOutcome {
    /// Returns true if the endpoint answered.
    #[must_use]
    pub const fn is_responded(&self) -> bool {
        matches!(self, Self::Responded { .. })
    }
}

/// Sends one templated HTTP request per triggering input and maps the
/// outcome into output events.
///
/// Inputs are handled strictly one at a time: each cycle is awaited to
/// completion before the next begins. Exactly one request attempt is made
/// per input.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `E`: Where output events go
/// - `R`: Template resolver (defaults to [`HandlebarsResolver`])
/// - `F`: File-pointer resolver (defaults to [`FsFileProvider`])
/// - `L`: Diagnostic record log (defaults to [`TracingLog`])
#[derive(Debug)]
pub struct Dispatcher<H, E, R = HandlebarsResolver, F = FsFileProvider, L = TracingLog> {
    config: Configuration,
    client: H,
    sink: E,
    resolver: R,
    files: F,
    log: L,
}

impl<H, E> Dispatcher<H, E> {
    /// Creates a dispatcher with the production resolver, file provider and log.
    #[must_use]
    pub fn new(config: Configuration, client: H, sink: E) -> Self {
        Self {
            config,
            client,
            sink,
            resolver: HandlebarsResolver::new(),
            files: FsFileProvider,
            log: TracingLog,
        }
    }
}

impl<H, E, R, F, L> Dispatcher<H, E, R, F, L> {
    /// Replaces the template resolver.
    #[must_use]
    pub fn with_resolver<R2>(self, resolver: R2) -> Dispatcher<H, E, R2, F, L> {
        Dispatcher {
            config: self.config,
            client: self.client,
            sink: self.sink,
            resolver,
            files: self.files,
            log: self.log,
        }
    }

    /// Replaces the file provider.
    #[must_use]
    pub fn with_file_provider<F2>(self, files: F2) -> Dispatcher<H, E, R, F2, L> {
        Dispatcher {
            config: self.config,
            client: self.client,
            sink: self.sink,
            resolver: self.resolver,
            files,
            log: self.log,
        }
    }

    /// Replaces the diagnostic record log.
    #[must_use]
    pub fn with_log<L2>(self, log: L2) -> Dispatcher<H, E, R, F, L2> {
        Dispatcher {
            config: self.config,
            client: self.client,
            sink: self.sink,
            resolver: self.resolver,
            files: self.files,
            log,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.config
    }
}

impl<H, E, R, F, L> Dispatcher<H, E, R, F, L>
where
    H: HttpClient,
    E: EventSink,
    R: TemplateResolver,
    F: FileProvider,
    L: RecordLog,
{
    /// Handles a batch of events, in order, one cycle each.
    pub async fn on_events(&self, events: &[Event]) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.receive(event).await);
        }
        outcomes
    }

    /// Handles one event.
    pub async fn receive(&self, event: &Event) -> CycleOutcome {
        self.handle(Some(event)).await
    }

    /// Runs a scheduled check: the payload alone, with no event.
    pub async fn on_schedule(&self) -> CycleOutcome {
        self.handle(None).await
    }

    async fn handle(&self, event: Option<&Event>) -> CycleOutcome {
        let empty = Map::new();
        let context = event.map_or(&empty, |e| &e.payload);

        let resolved = match self.config.resolve(&self.resolver, context) {
            Ok(resolved) => resolved,
            Err(e) => {
                let base = mapper::base_payload(self.config.output_mode_unrendered(), event);
                let report = self.report(&CycleError::from(e), self.config.raw_endpoint());
                return self.fail(base, &report, self.config.emits_events_unrendered());
            }
        };

        let base = mapper::base_payload(resolved.output_mode, event);
        let data = working_data(&resolved, event);

        let request = match self.prepare(&resolved, data, event).await {
            Ok(request) => request,
            Err(e) => {
                let report = self.report(&e, resolved.endpoint.clone());
                return self.fail(base, &report, resolved.emit_events);
            }
        };

        // GET+JSON folds the data into the query; failures report that URL.
        let url = request.url.to_string();
        tracing::debug!(method = %request.verb, url = %url, "Sending request");

        match self
            .client
            .request(request.into_http_request(resolved.request_options))
            .await
        {
            Ok(response) => {
                let status = response.status.as_u16();
                tracing::debug!(status, url = %url, "Request completed");
                if resolved.emit_events {
                    let view = HeaderView {
                        style: resolved.header_style,
                        allowlist: self.config.event_headers(),
                        key: self.config.event_headers_key(),
                    };
                    self.sink.emit(mapper::success_payload(base, &response, view));
                }
                CycleOutcome::Responded { status }
            }
            Err(e) => {
                let report = self.report(&CycleError::from(e), url);
                self.fail(base, &report, resolved.emit_events)
            }
        }
    }

    /// Builds the outgoing request and writes the `log_requests` record.
    async fn prepare(
        &self,
        resolved: &ResolvedOptions,
        data: Value,
        event: Option<&Event>,
    ) -> Result<OutgoingRequest, CycleError> {
        let headers = build_headers(&resolved.headers)?;
        let verb: HttpVerb = resolved.method.parse()?;

        let upload = match event.and_then(|e| e.file_pointer.as_ref()) {
            Some(pointer) if verb.has_body() => Some(self.files.open(pointer).await?),
            _ => None,
        };

        let encoding = Encoding {
            content_type: resolved.content_type.clone(),
            upload_key: resolved.upload_key.clone(),
            xml_root: resolved.xml_root.clone(),
        };
        let request = build(
            verb.as_str(),
            &resolved.endpoint,
            data,
            headers,
            &encoding,
            upload,
        )?;

        if resolved.log_requests {
            self.log.log(request.log_record());
        }
        Ok(request)
    }

    fn report(&self, error: &CycleError, endpoint: String) -> FailureReport {
        FailureReport {
            status: error.status_code(),
            error_message: error.to_string(),
            endpoint,
            payload_options: self.config.raw_payload(),
        }
    }

    fn fail(
        &self,
        base: Map<String, Value>,
        report: &FailureReport,
        emit: bool,
    ) -> CycleOutcome {
        tracing::warn!(
            status = report.status,
            endpoint = %report.endpoint,
            "Request failed: {}",
            report.error_message
        );
        self.log.log(report.log_record());
        if emit {
            self.sink.emit(mapper::failure_payload(base, report));
        }
        CycleOutcome::Failed {
            status: report.status,
            message: report.error_message.clone(),
        }
    }
}

/// The data sent for one cycle.
///
/// With an event and without `no_merge`, the event's fields are overlaid
/// with the payload's fields (payload wins). A non-map payload cannot be
/// merged and is sent as-is.
fn working_data(resolved: &ResolvedOptions, event: Option<&Event>) -> Value {
    match (event, &resolved.payload) {
        (Some(event), Value::Object(fields)) if !resolved.no_merge => {
            let mut merged = event.payload.clone();
            merged.extend(fields.clone());
            Value::Object(merged)
        }
        _ => resolved.payload.clone(),
    }
}
