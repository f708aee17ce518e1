use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::EventKind;

/// Screen-space rectangle in CSS pixels. Origin may be negative on
/// multi-display setups where a display sits left of or above the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }
}

/// Identifier of a cell tower, e.g. `NL-0042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerId(String);

impl TowerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TowerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TowerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical purpose of an auxiliary window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowRole {
    Info,
    Monitor,
    Console,
}

impl WindowRole {
    pub const ALL: [WindowRole; 3] = [WindowRole::Info, WindowRole::Monitor, WindowRole::Console];

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowRole::Info => "info",
            WindowRole::Monitor => "monitor",
            WindowRole::Console => "console",
        }
    }

    /// The event a window of this role is driven by, if any.
    ///
    /// The console is opened and focused but never receives tower updates.
    pub fn event_kind(&self) -> Option<EventKind> {
        match self {
            WindowRole::Info => Some(EventKind::OpenTowerInfo),
            WindowRole::Monitor => Some(EventKind::StartMonitoring),
            WindowRole::Console => None,
        }
    }
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
