//! BLAKE3 digests for stored blobs, truncated to 128 bits (32 hex chars).
//!
//! Paths in this store are not content-derived, so the digest serves as an etag:
//! it tells a reader whether the photo at a path changed since it was last seen.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const HEX_LEN: usize = 32;

/// Truncated BLAKE3 digest of a blob's bytes.
///
/// Deserializing goes through [`FromStr`], so a damaged sidecar is rejected on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("expected {HEX_LEN} hex chars, got {0}")]
    InvalidLength(usize),

    #[error("hash contains a non-hex character")]
    InvalidHex,
}

impl ContentHash {
    pub fn of(data: &[u8]) -> Self {
        let digest = blake3::hash(data);
        Self(hex::encode(&digest.as_bytes()[..HEX_LEN / 2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HEX_LEN {
            return Err(HashError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
