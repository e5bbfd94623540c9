//! Request construction.
//!
//! This module provides:
//! - Content-type resolution ([`ContentType`])
//! - Outbound header building and response header normalization ([`headers`])
//! - Query/form parameter flattening ([`params`])
//! - XML serialization ([`xml`])
//! - The encoding-strategy dispatcher ([`build`], [`OutgoingRequest`])

mod builder;
mod content_type;
mod error;
pub mod headers;
pub mod params;
pub mod xml;


pub use builder::{Encoding, HttpVerb, OutgoingRequest, build};
pub use content_type::{ContentType, JSON_CONTENT_TYPE, XML_CONTENT_TYPE, looks_like_mime};
pub use error::RequestError;
pub use headers::{HeaderStyle, build_headers, normalize_response_headers};
