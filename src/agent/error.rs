//! Error type for a single handling cycle.

use thiserror::Error;

use crate::event::FileError;
use crate::request::RequestError;
use crate::template::TemplateError;
use crate::transport::HttpError;

/// Status reported for failures that carry no HTTP status.
pub const FALLBACK_STATUS: u16 = 500;

/// Everything that can end a handling cycle early.
///
/// A cycle error is isolated to its triggering input: it is logged, routed
/// to the failure mapper, and the next input is processed normally.
#[derive(Debug, Error)]
pub enum CycleError {
    /// An option template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The request could not be built (method, URL, headers, encoding).
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The event's file pointer could not be opened.
    #[error(transparent)]
    File(#[from] FileError),

    /// The transport failed or rejected the response.
    #[error(transparent)]
    Transport(#[from] HttpError),
}

impl CycleError {
    /// Returns the HTTP status carried by the failure, if any.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Transport(error) => error.status(),
            _ => None,
        }
    }

    /// The status reported in failure events: the carried status or 500.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status()
            .map_or(FALLBACK_STATUS, |status| status.as_u16())
    }
}
