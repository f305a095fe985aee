//! Configuration loading and discovery for `mosaic.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::MosaicConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery.
pub const CONFIG_FILE_NAME: &str = "mosaic.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse mosaic.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override new-grid rows
    pub rows: Option<usize>,
    /// Override new-grid columns
    pub columns: Option<usize>,
    /// Override the rationing round cap
    pub max_rounds: Option<usize>,
    /// Override the import alpha threshold
    pub alpha_threshold: Option<u8>,
    /// Override the log level
    pub log_level: Option<String>,
}

/// Find mosaic.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for mosaic.toml
/// 2. Check XDG_CONFIG_HOME/mosaicplan/mosaic.toml (or ~/.config/mosaicplan/mosaic.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find mosaic.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("mosaicplan").join(CONFIG_FILE_NAME);
    config_path.exists().then_some(config_path)
}

/// Find mosaic.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a mosaic.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses [`find_config`]
/// to locate the config file. If no config file is found, returns the
/// default configuration.
///
/// The result is not validated: CLI overrides are merged first, then the
/// caller runs [`MosaicConfig::validate`] on the merged value.
pub fn load_config(path: Option<&Path>) -> Result<MosaicConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(default_config()),
    }
}

fn load_config_file(path: &Path) -> Result<MosaicConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Configuration used when no mosaic.toml is found.
pub fn default_config() -> MosaicConfig {
    MosaicConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut MosaicConfig, overrides: &CliOverrides) {
    if let Some(rows) = overrides.rows {
        config.grid.rows = rows;
    }
    if let Some(columns) = overrides.columns {
        config.grid.columns = columns;
    }
    if let Some(max_rounds) = overrides.max_rounds {
        config.import.max_rounds = max_rounds;
    }
    if let Some(alpha) = overrides.alpha_threshold {
        config.import.alpha_threshold = alpha;
    }
    if let Some(ref level) = overrides.log_level {
        config.logging.level = level.clone();
    }
}
