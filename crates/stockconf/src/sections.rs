//! Config sections. Every field has a default so a partial file is always valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Filesystem locations for the local backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the JSON record collection lives.
    /// Default: ~/.local/share/stockpile
    pub state_dir: PathBuf,

    /// Root of the file blob store.
    /// Default: ~/.stockpile/blobs
    pub blob_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self {
            state_dir: home
                .as_ref()
                .map(|h| h.join(".local/share/stockpile"))
                .unwrap_or_else(|| PathBuf::from(".local/share/stockpile")),
            blob_dir: home
                .map(|h| h.join(".stockpile/blobs"))
                .unwrap_or_else(|| PathBuf::from(".stockpile/blobs")),
        }
    }
}

/// Document collection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Collection name. Default: inventory
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: "inventory".to_string(),
        }
    }
}

/// Blob path convention for item photos: `{prefix}/{name}.{extension}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobsConfig {
    /// Default: inventory_images
    pub prefix: String,

    /// Default: jpg
    pub extension: String,

    /// MIME type used for encoding and upload. Default: image/jpeg
    pub content_type: String,

    /// Public URL that serves the blob store's objects. Unset means `file://` URLs.
    pub public_base_url: Option<String>,
}

impl Default for BlobsConfig {
    fn default() -> Self {
        Self {
            prefix: "inventory_images".to_string(),
            extension: "jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            public_base_url: None,
        }
    }
}

/// Snapshot geometry and encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Default: 640
    pub width: u32,

    /// Default: 480
    pub height: u32,

    /// JPEG quality, 1-100. Default: 85
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            jpeg_quality: 85,
        }
    }
}

/// Order of the two store writes when an edit changes an item's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameOrder {
    /// Delete the old record, then write the new one. A failed write loses the item.
    #[default]
    DeleteFirst,
    /// Refuse taken names, write the new record, then delete the old one,
    /// undoing the write if that delete fails.
    WriteFirst,
}

/// What happens to an item's photo URL when it is renamed without a new photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameImagePolicy {
    /// The renamed record starts without a photo.
    #[default]
    Drop,
    /// The renamed record keeps pointing at the old blob.
    CarryForward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown setting {:?}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for RenameOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete-first" => Ok(Self::DeleteFirst),
            "write-first" => Ok(Self::WriteFirst),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for RenameOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DeleteFirst => "delete-first",
            Self::WriteFirst => "write-first",
        })
    }
}

impl FromStr for RenameImagePolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(Self::Drop),
            "carry-forward" => Ok(Self::CarryForward),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for RenameImagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drop => "drop",
            Self::CarryForward => "carry-forward",
        })
    }
}

/// Consistency knobs for the sync controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub rename_order: RenameOrder,
    pub rename_image: RenameImagePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full EnvFilter string).
    /// Default: info
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
