//! Cross-window communication and window-lifecycle coordination.
//!
//! - A named broadcast [`channel`] shared by every window of a session
//! - A per-role window registry with lazy stale-handle detection
//! - Placement of new windows, optionally on a secondary display
//! - The [`WindowCoordinator`] tying them together behind
//!   `request_show` / `broadcast_update` / `set_prefer_secondary`
//!
//! The browser itself is abstracted behind [`WindowHost`] and
//! [`DisplayProvider`]; [`sim`] provides in-memory implementations.

pub mod channel;
pub mod coordinator;
pub mod host;
pub mod launch;
pub mod placement;
pub mod sim;

pub use channel::{Channel, ChannelHub, ChannelSender};
pub use coordinator::{RoleState, ShowOutcome, WindowCoordinator, WindowHandle, WindowRegistry};
pub use host::{AuxWindow, OpenRequest, WindowHost};
pub use launch::{launch_url, parse_launch_tower_id, TOWER_ID_PARAM};
pub use placement::{
    DisplayProvider, PermissionState, Placement, PlacementStrategy, Screen, ScreenDetails,
};
