//! Output collaborators: where emitted events and diagnostic records go.

use std::io::Write;
use std::sync::Mutex;

use serde_json::{Map, Value, json};

/// Receives output events.
pub trait EventSink: Send + Sync {
    /// Emits one output event with the given payload.
    fn emit(&self, payload: Map<String, Value>);
}

/// Receives diagnostic records (request logs and failure reports).
pub trait RecordLog: Send + Sync {
    /// Records one diagnostic entry.
    fn log(&self, record: Map<String, Value>);
}

/// Writes each emitted event as one JSON line: `{"payload": {...}}`.
///
/// The same shape is accepted as input, so dispatchers can be chained
/// through a pipe.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl JsonLinesSink<std::io::Stdout> {
    /// Creates a sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, payload: Map<String, Value>) {
        let line = json!({ "payload": payload }).to_string();
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::error!("Failed to write event: {e}");
        }
    }
}

/// Writes records through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl RecordLog for TracingLog {
    fn log(&self, record: Map<String, Value>) {
        let rendered = Value::Object(record).to_string();
        tracing::info!("{rendered}");
    }
}
