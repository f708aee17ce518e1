use std::path::PathBuf;

use cellmap_common::ConfigError;

pub(crate) const APP_NAME: &str = "cellmap";

/// Platform configuration directory for cellmap.
///
/// - macOS: `~/Library/Application Support/cellmap`
/// - Linux: `$XDG_CONFIG_HOME/cellmap` (defaults to `~/.config/cellmap`)
/// - Windows: `%APPDATA%\cellmap`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?
        .join(APP_NAME))
}

/// Platform data directory for cellmap. Holds the durable key/value store.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::data_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine data directory".into()))?
        .join(APP_NAME))
}
