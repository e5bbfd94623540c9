//! The request dispatcher agent.
//!
//! This module provides:
//! - The dispatcher that runs one handling cycle per input ([`Dispatcher`])
//! - Mapping of responses and failures into output events ([`mapper`])
//! - Output collaborators ([`EventSink`], [`RecordLog`])
//! - The per-cycle error type ([`CycleError`])

mod dispatcher;
mod error;
pub mod mapper;
mod sink;

#[cfg(test)]
mod dispatcher_tests;

pub use dispatcher::{CycleOutcome, Dispatcher};
pub use error::{CycleError, FALLBACK_STATUS};
pub use sink::{EventSink, JsonLinesSink, RecordLog, TracingLog};
