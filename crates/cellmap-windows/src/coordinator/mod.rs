//! The map window's side of window coordination.
//!
//! [`WindowCoordinator`] opens or reuses one auxiliary window per role,
//! places new windows, and tells open windows which tower to show by
//! sending events on the session channel. A freshly opened window gets its
//! event after a grace period, by which time it has subscribed; until then
//! it initializes itself from its launch URL.

mod handle;
mod outbox;
mod registry;

pub use handle::WindowHandle;
pub use registry::{RoleState, WindowRegistry};

use std::sync::Arc;

use cellmap_common::{EventKind, ShowError, StoreError, TowerId, TowerPayload, WindowId, WindowRole};
use cellmap_config::{CoordinatorConfig, KeyValueStore, PREFER_SECONDARY_KEY};
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelHub};
use crate::host::{OpenRequest, WindowHost};
use crate::launch::launch_url;
use crate::placement::{DisplayProvider, PlacementStrategy};

use outbox::Outbox;

/// What `request_show` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The role's window was already open and got focus.
    Focused { window: WindowId },
    /// A new window was opened. `reopened` is set when it replaced one the
    /// user had closed.
    Opened { window: WindowId, reopened: bool },
}

impl ShowOutcome {
    pub fn window(&self) -> &WindowId {
        match self {
            Self::Focused { window } | Self::Opened { window, .. } => window,
        }
    }
}

/// Coordinates the auxiliary windows of one map window.
///
/// End a session with [`shutdown`](Self::shutdown). Dropping the coordinator
/// releases its channel endpoint immediately, so events still waiting out
/// their grace period are discarded.
pub struct WindowCoordinator {
    config: CoordinatorConfig,
    host: Box<dyn WindowHost>,
    placement: PlacementStrategy,
    store: Arc<dyn KeyValueStore>,
    channel: Channel,
    outbox: Outbox,
    registry: WindowRegistry,
    prefer_secondary: bool,
}

impl WindowCoordinator {
    /// Build a coordinator with its own endpoint on the configured channel.
    ///
    /// The secondary-display preference is read from `store` once, here.
    /// Must be called inside a Tokio runtime.
    pub fn new(
        config: CoordinatorConfig,
        hub: &ChannelHub,
        host: Box<dyn WindowHost>,
        displays: Arc<dyn DisplayProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let channel = hub.open(&config.channel.name);
        let outbox = Outbox::spawn(channel.sender());
        let placement = PlacementStrategy::new(config.placement.clone(), displays);
        let prefer_secondary = store.get_bool(PREFER_SECONDARY_KEY).unwrap_or(false);

        info!(
            channel = %config.channel.name,
            prefer_secondary,
            grace_ms = config.timing.grace_period_ms,
            "window coordinator ready"
        );

        Self {
            config,
            host,
            placement,
            store,
            channel,
            outbox,
            registry: WindowRegistry::new(),
            prefer_secondary,
        }
    }

    pub fn prefer_secondary(&self) -> bool {
        self.prefer_secondary
    }

    /// Change and persist the secondary-display preference.
    ///
    /// The in-memory value changes even if persisting fails.
    pub fn set_prefer_secondary(&mut self, value: bool) -> Result<(), StoreError> {
        self.prefer_secondary = value;
        debug!(value, "secondary display preference changed");
        self.store.set_bool(PREFER_SECONDARY_KEY, value)
    }

    /// Show the window for `role`, opening it if needed, and point it at
    /// `tower_id`.
    ///
    /// An open window is focused and gets its event right away. A new
    /// window gets it after the grace period. Roles without an event, or a
    /// call without a tower id, send nothing.
    pub async fn request_show(
        &mut self,
        role: WindowRole,
        tower_id: Option<TowerId>,
    ) -> Result<ShowOutcome, ShowError> {
        if let Some(handle) = self.registry.live(role) {
            handle.focus();
            let window = handle.id().clone();
            debug!(%role, %window, "focusing existing window");
            if let Some((kind, payload)) = Self::event_for(role, tower_id) {
                self.outbox.send_now(kind, payload);
            }
            return Ok(ShowOutcome::Focused { window });
        }

        let reopened = self.registry.prune_stale(role);
        let spec = self.config.windows.spec(role).clone();
        let anchor = self.host.current_bounds();
        let placement = self
            .placement
            .compute(anchor, spec.width, spec.height, self.prefer_secondary)
            .await;

        let request = OpenRequest {
            role,
            url: launch_url(&spec.document, tower_id.as_ref()),
            target: spec.target,
            width: spec.width,
            height: spec.height,
            placement,
        };

        let Some(window) = self.host.open(&request) else {
            warn!(%role, url = %request.url, "window could not be opened, popup blocked?");
            return Err(ShowError::PopupBlocked(role));
        };

        let handle = WindowHandle::new(role, request.url, window);
        let window = handle.id().clone();
        info!(
            %role,
            %window,
            url = %handle.url(),
            left = placement.left,
            top = placement.top,
            reopened,
            "window opened"
        );
        self.registry.insert(handle);

        if let Some((kind, payload)) = Self::event_for(role, tower_id) {
            self.outbox
                .send_after(self.config.timing.grace_period(), kind, payload);
        }

        Ok(ShowOutcome::Opened { window, reopened })
    }

    /// Tell every listening window about `tower_id`, open or not.
    pub fn broadcast_update(&self, tower_id: &TowerId) {
        debug!(tower = %tower_id, "broadcasting tower update");
        self.outbox
            .send_now(EventKind::OpenTowerInfo, TowerPayload::new(tower_id.clone()));
        self.outbox
            .send_now(EventKind::StartMonitoring, TowerPayload::new(tower_id.clone()));
    }

    /// The map's "view details" action: show the info window for the tower
    /// and ask any monitor to switch to it as well.
    pub async fn open_tower_details(
        &mut self,
        tower_id: &TowerId,
    ) -> Result<ShowOutcome, ShowError> {
        let outcome = self
            .request_show(WindowRole::Info, Some(tower_id.clone()))
            .await?;
        self.outbox
            .send_now(EventKind::StartMonitoring, TowerPayload::new(tower_id.clone()));
        Ok(outcome)
    }

    pub fn role_state(&self, role: WindowRole) -> RoleState {
        self.registry.state(role)
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Close every open auxiliary window. Returns how many were closed.
    pub fn close_all_windows(&mut self) -> usize {
        let closed = self.registry.close_all();
        if closed > 0 {
            info!(closed, "closed auxiliary windows");
        }
        closed
    }

    /// Deliver pending events, including grace-delayed ones, then close all
    /// windows and release the channel.
    pub async fn shutdown(self) {
        let Self {
            outbox,
            channel,
            mut registry,
            ..
        } = self;
        outbox.flush().await;
        let closed = registry.close_all();
        channel.close();
        info!(closed, "window coordinator shut down");
    }

    fn event_for(
        role: WindowRole,
        tower_id: Option<TowerId>,
    ) -> Option<(EventKind, TowerPayload)> {
        let kind = role.event_kind()?;
        let tower_id = tower_id?;
        Some((kind, TowerPayload::new(tower_id)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
