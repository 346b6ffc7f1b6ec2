//! Minimal configuration loading for Stockpile.
//!
//! Every binary and backend in the workspace reads its settings from one
//! [`StockConfig`], built once at startup and passed down explicitly.
//!
//! # Usage
//!
//! ```rust,no_run
//! use stockconf::StockConfig;
//!
//! let config = StockConfig::load().expect("Failed to load config");
//! println!("records in {}", config.paths.state_dir.display());
//! println!("photos under {}/", config.blobs.prefix);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, tables merge key by key):
//! 1. `/etc/stockpile/config.toml` (system)
//! 2. `~/.config/stockpile/config.toml` (user)
//! 3. `./stockpile.toml` or the `--config` path (local override)
//! 4. Environment variables (`STOCKPILE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! state_dir = "~/.local/share/stockpile"
//! blob_dir = "~/.stockpile/blobs"
//!
//! [store]
//! collection = "inventory"
//!
//! [blobs]
//! prefix = "inventory_images"
//! extension = "jpg"
//! content_type = "image/jpeg"
//! public_base_url = "https://cdn.example.com/stock/"
//!
//! [capture]
//! width = 640
//! height = 480
//! jpeg_quality = 85
//!
//! [sync]
//! rename_order = "delete-first"   # or "write-first"
//! rename_image = "drop"           # or "carry-forward"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{
    BlobsConfig, CaptureConfig, PathsConfig, RenameImagePolicy, RenameOrder, StoreConfig,
    SyncConfig, TelemetryConfig, UnknownVariant,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Complete Stockpile configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    pub paths: PathsConfig,
    pub store: StoreConfig,
    pub blobs: BlobsConfig,
    pub capture: CaptureConfig,
    pub sync: SyncConfig,
    pub telemetry: TelemetryConfig,
}

impl StockConfig {
    /// Load from defaults, the standard files, and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), with `config_path` replacing `./stockpile.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let mut config = Self::from_table(merged).map_err(|e| ConfigError::Invalid {
            field: "config",
            message: e.to_string(),
        })?;
        loader::apply_env_overrides(&mut config, &mut sources);
        config.expand_paths();
        config.validate()?;

        Ok((config, sources))
    }

    /// Parse a single TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table = loader::parse_table(contents, Path::new("<inline>"))?;
        let mut config = Self::from_table(table).map_err(|e| ConfigError::Invalid {
            field: "config",
            message: e.to_string(),
        })?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn from_table(table: toml::Table) -> Result<Self, toml::de::Error> {
        toml::Value::Table(table).try_into()
    }

    fn expand_paths(&mut self) {
        self.paths.state_dir = loader::expand_path(&self.paths.state_dir.to_string_lossy());
        self.paths.blob_dir = loader::expand_path(&self.paths.blob_dir.to_string_lossy());
    }

    /// Reject values that would only fail later, deep inside a capture or upload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(ConfigError::Invalid {
                field: "capture",
                message: format!(
                    "snapshot size must be non-zero, got {}x{}",
                    self.capture.width, self.capture.height
                ),
            });
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "capture.jpeg_quality",
                message: format!("must be 1-100, got {}", self.capture.jpeg_quality),
            });
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.collection",
                message: "must not be empty".to_string(),
            });
        }
        if self.blobs.prefix.is_empty() || self.blobs.extension.is_empty() {
            return Err(ConfigError::Invalid {
                field: "blobs",
                message: "prefix and extension must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> String {
        let body =
            toml::to_string_pretty(self).unwrap_or_else(|e| format!("# unrenderable: {e}\n"));
        format!("# Stockpile Configuration\n\n{body}")
    }
}
