//! Triggering events and file-pointer resolution.
//!
//! An [`Event`] is the record that causes one handling cycle. Events may
//! carry a [`FilePointer`], which a [`FileProvider`] turns into an
//! [`UploadFile`] for multipart uploads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::transport::UploadFile;

/// A reference to a file produced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePointer {
    /// Location of the file (a local path for [`FsFileProvider`])
    pub file: String,
    /// Declared MIME type, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// An upstream event.
///
/// Read-only to the dispatcher: it is never mutated, only copied from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event fields
    #[serde(default)]
    pub payload: Map<String, Value>,
    /// Optional attached file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pointer: Option<FilePointer>,
}

impl Event {
    /// Creates an event with the given payload and no file.
    #[must_use]
    pub const fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            file_pointer: None,
        }
    }

    /// Attaches a file pointer.
    #[must_use]
    pub fn with_file_pointer(mut self, pointer: FilePointer) -> Self {
        self.file_pointer = Some(pointer);
        self
    }

    /// Returns true if the event references a file.
    #[must_use]
    pub const fn has_file_pointer(&self) -> bool {
        self.file_pointer.is_some()
    }

    /// Parses one line of JSON input.
    ///
    /// An object with a `payload` map is read as a full event (optionally
    /// with a `file_pointer`). Any other object is taken as the payload
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a JSON object.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        match value {
            Value::Object(map) if map.get("payload").is_some_and(Value::is_object) => {
                serde_json::from_value(Value::Object(map))
            }
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// Error resolving a file pointer.
#[derive(Debug, Error)]
pub enum FileError {
    /// The referenced file could not be read.
    #[error("Failed to read file '{}': {source}", path.display())]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Resolves file pointers into uploadable files.
pub trait FileProvider: Send + Sync {
    /// Loads the file referenced by `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`FileError`] if the file cannot be read.
    fn open(
        &self,
        pointer: &FilePointer,
    ) -> impl std::future::Future<Output = Result<UploadFile, FileError>> + Send;
}

/// Reads file pointers as paths on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileProvider;

impl FileProvider for FsFileProvider {
    async fn open(&self, pointer: &FilePointer) -> Result<UploadFile, FileError> {
        let path = Path::new(&pointer.file);
        let bytes = tokio::fs::read(path).await.map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map_or_else(|| pointer.file.clone(), |n| n.to_string_lossy().into_owned());

        Ok(UploadFile {
            filename,
            content_type: pointer.content_type.clone(),
            bytes,
        })
    }
}
