//! Auxiliary window configuration types.

use cellmap_common::WindowRole;
use serde::{Deserialize, Serialize};

/// What to open for one role: the target document, the window target name
/// (reused by the host to find an existing window), and the outer size.
///
/// A `[windows.<role>]` table replaces the role's defaults as a whole, so
/// all four fields must be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub document: String,
    pub target: String,
    pub width: u32,
    pub height: u32,
}

impl WindowSpec {
    fn new(document: &str, target: &str, width: u32, height: u32) -> Self {
        Self {
            document: document.into(),
            target: target.into(),
            width,
            height,
        }
    }

    pub fn info() -> Self {
        Self::new("tower-info.html", "tower_info_window", 600, 700)
    }

    pub fn monitor() -> Self {
        Self::new("monitor.html", "monitor_window", 800, 600)
    }

    pub fn console() -> Self {
        Self::new("console.html", "console_window", 900, 520)
    }
}

/// Per-role window specs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowsConfig {
    #[serde(default = "WindowSpec::info")]
    pub info: WindowSpec,
    #[serde(default = "WindowSpec::monitor")]
    pub monitor: WindowSpec,
    #[serde(default = "WindowSpec::console")]
    pub console: WindowSpec,
}

impl WindowsConfig {
    pub fn spec(&self, role: WindowRole) -> &WindowSpec {
        match role {
            WindowRole::Info => &self.info,
            WindowRole::Monitor => &self.monitor,
            WindowRole::Console => &self.console,
        }
    }
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            info: WindowSpec::info(),
            monitor: WindowSpec::monitor(),
            console: WindowSpec::console(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
