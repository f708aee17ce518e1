//! In-memory window host and display provider.
//!
//! Behaves like a browser for the parts the coordinator depends on: named
//! window targets, popup blocking, external closing, and the display API.
//! Used by the test suites and by the demo binary.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cellmap_common::{PlacementError, Rect, WindowId, WindowRole};
use tracing::debug;

use crate::host::{AuxWindow, OpenRequest, WindowHost};
use crate::placement::{DisplayProvider, PermissionState, Placement, Screen, ScreenDetails};

/// Called after the host creates a new window (not when a named target is
/// reused). Receives the request and the new window's id.
pub type OpenHook = Box<dyn FnMut(&OpenRequest, &WindowId) + Send>;

#[derive(Debug)]
struct SimWindowState {
    id: WindowId,
    role: WindowRole,
    target: String,
    url: Mutex<String>,
    placement: Placement,
    closed: AtomicBool,
    focus_count: AtomicUsize,
}

impl SimWindowState {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

struct SimWindow(Arc<SimWindowState>);

impl AuxWindow for SimWindow {
    fn id(&self) -> &WindowId {
        &self.0.id
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    fn focus(&self) {
        self.0.focus_count.fetch_add(1, Ordering::AcqRel);
    }

    fn close(&self) {
        self.0.closed.store(true, Ordering::Release);
    }
}

/// Snapshot of one simulated window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimWindowInfo {
    pub id: WindowId,
    pub role: WindowRole,
    pub target: String,
    pub url: String,
    pub placement: Placement,
    pub closed: bool,
    pub focus_count: usize,
}

struct SimState {
    bounds: Rect,
    block_popups: bool,
    windows: Vec<Arc<SimWindowState>>,
    on_open: Option<OpenHook>,
}

/// Cloneable in-memory [`WindowHost`]; clones share the same windows, so a
/// test can keep one clone to inspect or close windows the coordinator owns.
#[derive(Clone)]
pub struct SimulatedHost {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHost {
    /// A host whose requesting window sits at `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                bounds,
                block_popups: false,
                windows: Vec::new(),
                on_open: None,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_block_popups(&self, block: bool) {
        self.lock().block_popups = block;
    }

    pub fn set_on_open(&self, hook: OpenHook) {
        self.lock().on_open = Some(hook);
    }

    /// Every window ever created, in creation order.
    pub fn windows(&self) -> Vec<SimWindowInfo> {
        self.lock()
            .windows
            .iter()
            .map(|w| SimWindowInfo {
                id: w.id.clone(),
                role: w.role,
                target: w.target.clone(),
                url: w.url.lock().map(|u| u.clone()).unwrap_or_default(),
                placement: w.placement,
                closed: w.is_closed(),
                focus_count: w.focus_count.load(Ordering::Acquire),
            })
            .collect()
    }

    /// Number of windows ever created.
    pub fn created_count(&self) -> usize {
        self.lock().windows.len()
    }

    /// Open (not closed) windows for a role.
    pub fn live_count(&self, role: WindowRole) -> usize {
        self.lock()
            .windows
            .iter()
            .filter(|w| w.role == role && !w.is_closed())
            .count()
    }

    /// Close a window as the user would. Returns false if unknown or
    /// already closed.
    pub fn close_window(&self, id: &WindowId) -> bool {
        let state = self.lock();
        match state.windows.iter().find(|w| &w.id == id) {
            Some(w) if !w.is_closed() => {
                w.closed.store(true, Ordering::Release);
                debug!(window = %id, "simulated window closed externally");
                true
            }
            _ => false,
        }
    }

    /// Close every live window of a role. Returns how many were closed.
    pub fn close_role(&self, role: WindowRole) -> usize {
        let state = self.lock();
        let mut closed = 0;
        for w in state.windows.iter().filter(|w| w.role == role) {
            if !w.closed.swap(true, Ordering::AcqRel) {
                closed += 1;
            }
        }
        closed
    }
}

impl WindowHost for SimulatedHost {
    fn current_bounds(&self) -> Rect {
        self.lock().bounds
    }

    fn open(&mut self, request: &OpenRequest) -> Option<Box<dyn AuxWindow>> {
        let (window, created, mut hook) = {
            let mut state = self.lock();
            if state.block_popups {
                debug!(role = %request.role, "simulated popup blocked");
                return None;
            }

            // Named target still open: navigate it instead of creating another.
            let existing = state
                .windows
                .iter()
                .find(|w| w.target == request.target && !w.is_closed())
                .cloned();

            match existing {
                Some(window) => {
                    if let Ok(mut url) = window.url.lock() {
                        *url = request.url.clone();
                    }
                    (window, false, None)
                }
                None => {
                    let window = Arc::new(SimWindowState {
                        id: WindowId::new(),
                        role: request.role,
                        target: request.target.clone(),
                        url: Mutex::new(request.url.clone()),
                        placement: request.placement,
                        closed: AtomicBool::new(false),
                        focus_count: AtomicUsize::new(0),
                    });
                    state.windows.push(Arc::clone(&window));
                    (window, true, state.on_open.take())
                }
            }
        };

        if created {
            debug!(role = %request.role, window = %window.id, url = %request.url, "simulated window created");
        }

        // The hook runs unlocked so it may call back into the host.
        if let Some(hook) = hook.as_mut() {
            hook(request, &window.id);
        }
        if let Some(hook) = hook {
            let mut state = self.lock();
            if state.on_open.is_none() {
                state.on_open = Some(hook);
            }
        }

        Some(Box::new(SimWindow(window)))
    }
}

// =============================================================================
// DISPLAYS
// =============================================================================

/// How many display queries a [`SimulatedDisplays`] has answered.
#[derive(Debug, Clone, Default)]
pub struct QueryCount(Arc<AtomicUsize>);

impl QueryCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// Scripted [`DisplayProvider`].
#[derive(Debug, Clone)]
pub struct SimulatedDisplays {
    permission: Result<PermissionState, PlacementError>,
    details: Result<ScreenDetails, PlacementError>,
    queries: QueryCount,
}

impl SimulatedDisplays {
    /// A display whose available area leaves 40px for a taskbar.
    pub fn screen(label: &str, bounds: Rect) -> Screen {
        Screen {
            label: label.into(),
            bounds,
            available: Rect::new(
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height.saturating_sub(40),
            ),
            is_primary: bounds.x == 0 && bounds.y == 0,
        }
    }

    /// Granted permission, the given screens, current display first.
    pub fn with_screens(screens: Vec<Screen>) -> Self {
        Self {
            permission: Ok(PermissionState::Granted),
            details: Ok(ScreenDetails {
                screens,
                current: 0,
            }),
            queries: QueryCount::default(),
        }
    }

    /// One 1920x1080 display.
    pub fn single() -> Self {
        Self::with_screens(vec![Self::screen("primary", Rect::new(0, 0, 1920, 1080))])
    }

    /// Two 1920x1080 displays side by side; the requesting window is on the left one.
    pub fn dual() -> Self {
        Self::with_screens(vec![
            Self::screen("primary", Rect::new(0, 0, 1920, 1080)),
            Self::screen("secondary", Rect::new(1920, 0, 1920, 1080)),
        ])
    }

    pub fn with_permission(mut self, permission: Result<PermissionState, PlacementError>) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_details(mut self, details: Result<ScreenDetails, PlacementError>) -> Self {
        self.details = details;
        self
    }

    pub fn query_counter(&self) -> QueryCount {
        self.queries.clone()
    }
}

#[async_trait]
impl DisplayProvider for SimulatedDisplays {
    async fn permission(&self) -> Result<PermissionState, PlacementError> {
        self.queries.0.fetch_add(1, Ordering::AcqRel);
        self.permission.clone()
    }

    async fn screen_details(&self) -> Result<ScreenDetails, PlacementError> {
        self.queries.0.fetch_add(1, Ordering::AcqRel);
        self.details.clone()
    }
}
