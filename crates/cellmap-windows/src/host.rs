//! The seam to whatever actually creates windows.

use cellmap_common::{Rect, WindowId, WindowRole};

use crate::placement::Placement;

/// Everything a host needs to open one auxiliary window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub role: WindowRole,
    /// Document plus launch parameters, e.g. `tower-info.html?towerId=T-001`.
    pub url: String,
    /// Window target name. Hosts reuse a still-open window with the same name.
    pub target: String,
    pub width: u32,
    pub height: u32,
    pub placement: Placement,
}

/// A window opened by a host. Liveness is polled, never observed.
pub trait AuxWindow: Send {
    fn id(&self) -> &WindowId;

    /// Whether the user or OS closed the window since it was opened.
    fn is_closed(&self) -> bool;

    fn focus(&self);

    fn close(&self);
}

/// Opens windows on behalf of the requesting (map) window.
pub trait WindowHost: Send {
    /// Current outer bounds of the requesting window.
    fn current_bounds(&self) -> Rect;

    /// Open a window. `None` means the host refused (e.g. a popup blocker).
    fn open(&mut self, request: &OpenRequest) -> Option<Box<dyn AuxWindow>>;
}

