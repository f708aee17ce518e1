use std::path::PathBuf;

use crate::types::WindowRole;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config write error: {0}")]
    WriteError(String),
}

/// Failures of the durable key/value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store read error: {0}")]
    Read(String),

    #[error("store write error: {0}")]
    Write(String),

    #[error("store location unavailable: {0}")]
    Location(String),
}

/// Failures while querying display information. Never surfaced past the
/// placement strategy; it degrades to fallback coordinates instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("display query not supported: {0}")]
    Unsupported(String),

    #[error("display query failed: {0}")]
    QueryFailed(String),
}

/// Failure to show an auxiliary window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShowError {
    #[error("window for role '{0}' could not be opened (popup blocked?)")]
    PopupBlocked(WindowRole),
}

#[derive(Debug, thiserror::Error)]
pub enum CellmapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Show(#[from] ShowError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
