//! cellmap configuration and durable storage.
//!
//! Provides the TOML-based coordinator configuration (defaults for every
//! field, validation, a commented default file) and the per-origin
//! key/value store that carries preferences across sessions.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cellmap_config::{config_to_json, load_config};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod paths;
pub mod schema;
pub mod store;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ChannelConfig, CoordinatorConfig, PlacementConfig, TimingConfig, WindowSpec, WindowsConfig,
    CONFIG_SCHEMA_VERSION,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, ACTIVE_TOWER_KEY, PREFER_SECONDARY_KEY};

use std::path::Path;

use cellmap_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
pub fn load_config() -> Result<CoordinatorConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path override.
pub fn load_config_from(path: &Path) -> Result<CoordinatorConfig, ConfigError> {
    toml_loader::load_from_path(path)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &CoordinatorConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
