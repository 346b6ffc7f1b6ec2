//! Config file discovery, layered merging, and environment variable overlay.

use crate::{ConfigError, StockConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Where the effective config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// Returns existing files in load order: system, user, then the CLI path if it
/// exists, otherwise `./stockpile.toml`.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/stockpile/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("stockpile/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("stockpile.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a config file into a raw table, checking that it deserializes on its own.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_table(&contents, path)
}

pub(crate) fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(e.to_string()))?;

    // Surface type errors against the file that caused them, not the merged result.
    StockConfig::from_table(table.clone()).map_err(|e| parse_error(e.to_string()))?;

    Ok(table)
}

/// Deep-merge `overlay` into `base`. Nested tables merge key by key, anything else
/// in `overlay` replaces the value in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply `STOCKPILE_*` (and `RUST_LOG`) overrides from the process environment.
pub fn apply_env_overrides(config: &mut StockConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, env::vars());
}

/// Apply overrides from an explicit set of variables.
///
/// Values that fail to parse are ignored, leaving the file/default value in place.
pub fn apply_overrides_from(
    config: &mut StockConfig,
    sources: &mut ConfigSources,
    vars: impl IntoIterator<Item = (String, String)>,
) {
    for (key, value) in vars {
        let applied = match key.as_str() {
            "STOCKPILE_STATE_DIR" => {
                config.paths.state_dir = expand_path(&value);
                true
            }
            "STOCKPILE_BLOB_DIR" => {
                config.paths.blob_dir = expand_path(&value);
                true
            }
            "STOCKPILE_COLLECTION" => {
                config.store.collection = value;
                true
            }
            "STOCKPILE_PUBLIC_BASE_URL" => {
                config.blobs.public_base_url = Some(value).filter(|v| !v.is_empty());
                true
            }
            "STOCKPILE_CAPTURE_WIDTH" => set_parsed(&mut config.capture.width, &value),
            "STOCKPILE_CAPTURE_HEIGHT" => set_parsed(&mut config.capture.height, &value),
            "STOCKPILE_JPEG_QUALITY" => set_parsed(&mut config.capture.jpeg_quality, &value),
            "STOCKPILE_RENAME_ORDER" => set_parsed(&mut config.sync.rename_order, &value),
            "STOCKPILE_RENAME_IMAGE" => set_parsed(&mut config.sync.rename_image, &value),
            "STOCKPILE_LOG_LEVEL" | "RUST_LOG" => {
                config.telemetry.log_level = value;
                true
            }
            _ => false,
        };

        if applied {
            sources.env_overrides.push(key);
        }
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, value: &str) -> bool {
    match value.parse() {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}

/// Expand a leading `~/` or `$VAR/` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        return directories::BaseDirs::new()
            .map(|d| d.home_dir().join(rest))
            .unwrap_or_else(|| PathBuf::from(path));
    }

    if let Some(stripped) = path.strip_prefix('$') {
        let (var_name, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
        if let Ok(var_value) = env::var(var_name) {
            let base = PathBuf::from(var_value);
            return if rest.is_empty() { base } else { base.join(rest) };
        }
    }

    PathBuf::from(path)
}
