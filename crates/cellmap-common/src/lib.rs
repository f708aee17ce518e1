//! Shared types for the cellmap window coordination layer.
//!
//! Everything here is plain data: the event contract exchanged between
//! windows, window roles, tower identifiers, screen geometry, and the
//! error taxonomy used across the workspace.

pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{CellmapError, ConfigError, PlacementError, ShowError, StoreError};
pub use events::{Event, EventKind, TowerPayload};
pub use id::{new_id, WindowId};
pub use types::{Rect, TowerId, WindowRole};
