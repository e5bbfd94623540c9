//! Transport layer for sending HTTP requests to external services.
//!
//! This module provides types and traits for:
//! - Describing outbound requests ([`HttpRequest`], [`Body`], [`RequestOptions`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`], [`ClientSettings`])

mod client;
mod error;
mod http;


pub use client::{BasicAuth, ClientSettings, ReqwestClient};
pub use error::HttpError;
pub use http::{
    Body, HttpClient, HttpRequest, HttpResponse, Part, PartValue, RequestOptions, UploadFile,
};
