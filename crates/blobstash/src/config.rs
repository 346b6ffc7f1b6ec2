//! Blob store configuration.
//!
//! Default path: `~/.stockpile/blobs`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a filesystem blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashConfig {
    /// Base path for storage.
    /// Objects go to `{base_path}/objects/`, sidecars to `{base_path}/metadata/`.
    pub base_path: PathBuf,

    /// Whether to write the JSON sidecar next to each object.
    #[serde(default = "default_true")]
    pub store_metadata: bool,

    /// Read-only mode rejects every write.
    #[serde(default)]
    pub read_only: bool,

    /// Public URL prefix that maps onto `objects/`.
    ///
    /// When unset, URLs are `file://` URLs of the object on disk.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for StashConfig {
    fn default() -> Self {
        Self::with_base_path(default_stash_path())
    }
}

fn default_stash_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".stockpile").join("blobs"))
        .unwrap_or_else(|| PathBuf::from(".stockpile/blobs"))
}

impl StashConfig {
    /// Writable config rooted at `path`.
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            store_metadata: true,
            read_only: false,
            public_base_url: None,
        }
    }

    /// Read-only config rooted at `path`.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            store_metadata: false,
            read_only: true,
            public_base_url: None,
        }
    }

    /// Serve URLs from `base_url` instead of `file://`.
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into());
        self
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.base_path.join("objects")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.base_path.join("metadata")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.base_path.join("staging")
    }
}
