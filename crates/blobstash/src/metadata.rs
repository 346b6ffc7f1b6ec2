//! Sidecar metadata and the reference handed back to uploaders.

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::path::BlobPath;

/// JSON sidecar stored at `metadata/{path}.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobMetadata {
    /// MIME type supplied at upload, e.g. `image/jpeg`.
    pub content_type: String,
    pub size: u64,
    pub hash: ContentHash,
}

impl BlobMetadata {
    pub fn describe(data: &[u8], content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            size: data.len() as u64,
            hash: ContentHash::of(data),
        }
    }
}

/// Everything a caller needs to know about a stored blob without reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobReference {
    pub path: BlobPath,
    pub content_type: String,
    pub size_bytes: u64,
    pub hash: ContentHash,
    /// Retrievable URL for the object.
    pub url: String,
}

impl BlobReference {
    pub fn new(path: BlobPath, metadata: BlobMetadata, url: impl Into<String>) -> Self {
        Self {
            path,
            content_type: metadata.content_type,
            size_bytes: metadata.size,
            hash: metadata.hash,
            url: url.into(),
        }
    }
}
