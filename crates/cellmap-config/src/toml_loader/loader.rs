//! Config file reading, path resolution, and default file creation.

use std::path::{Path, PathBuf};

use cellmap_common::ConfigError;
use tracing::{info, warn};

use super::template::default_config_toml;
use crate::paths::config_dir;
use crate::schema::CoordinatorConfig;
use crate::validation;

/// Load config from a specific TOML file path.
///
/// Missing fields take their defaults. A file that parses but fails
/// validation is reported with a warning and replaced by the defaults.
pub fn load_from_path(path: &Path) -> Result<CoordinatorConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: CoordinatorConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(CoordinatorConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform default path, creating a commented
/// default file first if none exists.
pub fn load_default() -> Result<CoordinatorConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(CoordinatorConfig::default());
    }

    load_from_path(&path)
}

/// Platform default config file path (`<config_dir>/cellmap/config.toml`).
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Write the default TOML config (with documentation comments) to `path`.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::WriteError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_config_toml()).map_err(|e| {
        ConfigError::WriteError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}
