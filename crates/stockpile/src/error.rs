//! Error taxonomy for the sync path.
//!
//! Capture and codec errors live with their modules; everything that can escape
//! the [`SyncController`](crate::sync::SyncController) is a [`SyncError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::capture::CaptureError;

/// Input rejected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("item name must not be empty")]
    EmptyName,

    #[error("quantity must be at least {min}, got {got}")]
    QuantityTooLow { min: i64, got: i64 },

    #[error("quantity {0} is too large")]
    QuantityTooHigh(i64),
}

/// Failures from a record store backend. Not recoverable locally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("collection file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("document {name:?} is malformed: {message}")]
    Malformed { name: String, message: String },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Everything a submit, remove, adjust or refresh can fail with.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("camera unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("record store failure: {0}")]
    Store(#[from] StoreError),

    #[error("an item named {0:?} already exists")]
    NameTaken(String),

    #[error("no item named {0:?}")]
    NotFound(String),
}

impl From<CaptureError> for SyncError {
    fn from(err: CaptureError) -> Self {
        SyncError::CaptureUnavailable(err.to_string())
    }
}
