use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by an [`ObjectStore`](crate::ObjectStore) backend.
///
/// `NotFound` is the only variant callers are expected to recover from; it is
/// how a head probe reports a missing key.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("{operation} failed for {key}: {message}")]
    Request {
        operation: &'static str,
        key: String,
        message: String,
    },

    #[error("Failed to read object body for {key}: {message}")]
    Body { key: String, message: String },

    #[error("Failed to read local file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Build a `Request` error from any backend error, keeping its full
    /// source chain in the message.
    pub fn request(
        operation: &'static str,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Request {
            operation,
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
