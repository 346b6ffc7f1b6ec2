//! Validated relative blob paths.

use std::fmt;
use std::path::PathBuf;

use crate::error::BlobError;

/// A `/`-separated relative path naming one object, e.g. `inventory_images/Widget.jpg`.
///
/// Segments may contain spaces and any unicode, but never `.`/`..`, backslashes or
/// NUL, so a path can't escape the store root on any platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobPath(String);

impl BlobPath {
    pub fn new(path: impl Into<String>) -> Result<Self, BlobError> {
        let path = path.into();
        let invalid = |reason| BlobError::InvalidPath {
            path: path.clone(),
            reason,
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        if path.starts_with('/') {
            return Err(invalid("path must be relative"));
        }
        for segment in path.split('/') {
            match segment {
                "" => return Err(invalid("empty segment")),
                "." | ".." => return Err(invalid("relative segment")),
                s if s.contains(['\\', '\0']) => return Err(invalid("forbidden character")),
                _ => {}
            }
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Platform path relative to a store directory.
    pub fn to_relative_path(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
