//! Where a new auxiliary window goes on screen.
//!
//! Without the secondary-display preference a window opens near the
//! requesting window. With it, the strategy asks the host for display
//! details and centers the window on another display. Every failure on
//! that path degrades to a deterministic spot beside the requesting window;
//! nothing is reported to the caller.

mod display;

pub use display::{DisplayProvider, NoDisplayQuery, PermissionState, Screen, ScreenDetails};

use std::sync::Arc;

use cellmap_common::Rect;
use cellmap_config::PlacementConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-left corner for a new window. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub left: u32,
    pub top: u32,
}

impl Placement {
    fn clamped(left: i64, top: i64) -> Self {
        Self {
            left: clamp_coord(left),
            top: clamp_coord(top),
        }
    }
}

fn clamp_coord(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

pub struct PlacementStrategy {
    config: PlacementConfig,
    displays: Arc<dyn DisplayProvider>,
}

impl PlacementStrategy {
    pub fn new(config: PlacementConfig, displays: Arc<dyn DisplayProvider>) -> Self {
        Self { config, displays }
    }

    /// Compute the position of a `width` x `height` window opened from a
    /// window currently at `anchor`.
    pub async fn compute(
        &self,
        anchor: Rect,
        width: u32,
        height: u32,
        prefer_secondary: bool,
    ) -> Placement {
        if !prefer_secondary {
            return self.near(anchor);
        }

        match self.displays.permission().await {
            Ok(PermissionState::Granted | PermissionState::Prompt) => {}
            Ok(PermissionState::Denied) => {
                debug!("display permission denied, placing beside");
                return self.beside(anchor);
            }
            Err(e) => {
                debug!("display permission query failed, placing beside: {e}");
                return self.beside(anchor);
            }
        }

        let details = match self.displays.screen_details().await {
            Ok(details) => details,
            Err(e) => {
                debug!("display enumeration failed, placing beside: {e}");
                return self.beside(anchor);
            }
        };

        match details.target_screen() {
            Some(screen) => {
                debug!(screen = %screen.label, "centering on display");
                center_in(screen.available, width, height)
            }
            None => {
                debug!("no displays reported, placing beside");
                self.beside(anchor)
            }
        }
    }

    fn near(&self, anchor: Rect) -> Placement {
        let offset = i64::from(self.config.near_offset);
        Placement::clamped(i64::from(anchor.x) + offset, i64::from(anchor.y) + offset)
    }

    fn beside(&self, anchor: Rect) -> Placement {
        Placement::clamped(
            anchor.right() + i64::from(self.config.beside_gap),
            i64::from(anchor.y),
        )
    }
}

/// Center a window in `area`; a window larger than the area is pinned to
/// its top-left corner.
fn center_in(area: Rect, width: u32, height: u32) -> Placement {
    let slack_x = (i64::from(area.width) - i64::from(width)).max(0);
    let slack_y = (i64::from(area.height) - i64::from(height)).max(0);
    Placement::clamped(
        i64::from(area.x) + slack_x / 2,
        i64::from(area.y) + slack_y / 2,
    )
}

// =============================================================================
// TESTS
// =============================================================================
