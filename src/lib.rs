//! HTTP Dispatch: event-driven HTTP request dispatcher
//!
//! A library for turning incoming events (or scheduled ticks) into
//! templated outbound HTTP requests and mapping each response, or failure,
//! into an output event.

pub mod agent;
pub mod config;
pub mod event;
pub mod request;
pub mod template;
pub mod transport;
