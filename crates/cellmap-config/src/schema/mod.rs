//! Configuration schema types for the window coordinator.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod window;

pub use window::*;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub channel: ChannelConfig,
    pub timing: TimingConfig,
    pub placement: PlacementConfig,
    pub windows: WindowsConfig,
}

// =============================================================================
// Channel Config
// =============================================================================

/// Cross-window channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel name shared by every window of the session.
    pub name: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "cell_tower_channel".into(),
        }
    }
}

// =============================================================================
// Timing Config
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between opening a window and sending its first event
    /// (valid range: 0-2000 ms).
    pub grace_period_ms: u64,
}

impl TimingConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 200,
        }
    }
}

// =============================================================================
// Placement Config
// =============================================================================

/// Offsets used by the placement strategy's non-display paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Offset from the requesting window when secondary display is not preferred.
    pub near_offset: u32,
    /// Gap to the right of the requesting window for the fallback position.
    pub beside_gap: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            near_offset: 40,
            beside_gap: 20,
        }
    }
}
