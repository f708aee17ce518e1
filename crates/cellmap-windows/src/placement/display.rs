//! Display information as exposed by the host's window-management API.

use async_trait::async_trait;
use cellmap_common::{PlacementError, Rect};

/// State of the permission to read multi-display details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    /// Not decided yet; querying details will prompt the user.
    Prompt,
    Denied,
}

/// One connected display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub label: String,
    /// Full display bounds.
    pub bounds: Rect,
    /// Bounds minus taskbars, docks and similar reserved areas.
    pub available: Rect,
    pub is_primary: bool,
}

/// All displays plus the index of the one hosting the requesting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenDetails {
    pub screens: Vec<Screen>,
    pub current: usize,
}

impl ScreenDetails {
    /// Any display other than the current one, else the current one.
    pub fn target_screen(&self) -> Option<&Screen> {
        self.screens
            .iter()
            .enumerate()
            .find(|(index, _)| *index != self.current)
            .map(|(_, screen)| screen)
            .or_else(|| self.screens.get(self.current))
    }
}

/// Async access to display information. Both calls may suspend (the
/// permission query can prompt the user).
#[async_trait]
pub trait DisplayProvider: Send + Sync {
    async fn permission(&self) -> Result<PermissionState, PlacementError>;

    async fn screen_details(&self) -> Result<ScreenDetails, PlacementError>;
}

/// Provider for hosts without a window-management API.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplayQuery;

#[async_trait]
impl DisplayProvider for NoDisplayQuery {
    async fn permission(&self) -> Result<PermissionState, PlacementError> {
        Err(PlacementError::Unsupported("window management API unavailable".into()))
    }

    async fn screen_details(&self) -> Result<ScreenDetails, PlacementError> {
        Err(PlacementError::Unsupported("window management API unavailable".into()))
    }
}
