use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by blob store backends.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("blob store is in read-only mode")]
    ReadOnly,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metadata for {path}: {source}")]
    Metadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot build a URL for {path}: {reason}")]
    Url { path: String, reason: String },

    #[error("blob backend unavailable: {0}")]
    Unavailable(String),
}

impl BlobError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
