//! Receiving side of the window contract.
//!
//! Each auxiliary window gets a controller with its own endpoint on the
//! session channel. Controllers initialize from their launch URL and then
//! follow the events the map sends. The tower info window can also open
//! the monitor itself, through a coordinator of its own.

use std::sync::{Arc, Mutex, MutexGuard};

use cellmap_common::{Event, EventKind, ShowError, TowerId, WindowId, WindowRole};
use cellmap_config::{CoordinatorConfig, KeyValueStore, ACTIVE_TOWER_KEY};
use cellmap_windows::sim::SimulatedHost;
use cellmap_windows::{
    parse_launch_tower_id, Channel, ChannelHub, DisplayProvider, OpenRequest, ShowOutcome,
    WindowCoordinator,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a controller is showing, as reported at the end of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub window: String,
    pub role: WindowRole,
    pub tower: Option<TowerId>,
    /// Number of times the view (re)loaded a tower.
    pub loads: usize,
    pub last_event_at: Option<DateTime<Utc>>,
    pub open: bool,
}

#[derive(Debug, Default)]
struct ViewState {
    tower: Option<TowerId>,
    loads: usize,
    last_event_at: Option<DateTime<Utc>>,
}

impl ViewState {
    fn load(&mut self, tower: TowerId, event: Option<&Event>) {
        self.tower = Some(tower);
        self.loads += 1;
        if let Some(event) = event {
            self.last_event_at = Some(event.sent_at());
        }
    }
}

type SharedState = Arc<Mutex<ViewState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(|p| p.into_inner())
}

// =============================================================================
// TOWER INFO
// =============================================================================

/// Detail view for one tower.
pub struct TowerInfoView {
    window: WindowId,
    state: SharedState,
    channel: Channel,
    /// Windows this view opens itself. `None` for a view that cannot open
    /// windows.
    opener: tokio::sync::Mutex<Option<WindowCoordinator>>,
}

impl TowerInfoView {
    pub fn open(
        window: WindowId,
        url: &str,
        hub: &ChannelHub,
        channel_name: &str,
        opener: Option<WindowCoordinator>,
    ) -> Self {
        let state = SharedState::default();
        if let Some(tower) = parse_launch_tower_id(url) {
            debug!(%window, tower = %tower, "tower info loaded from launch url");
            lock(&state).load(tower, None);
        }

        let channel = hub.open(channel_name);
        let sink = Arc::clone(&state);
        let id = window.clone();
        channel.subscribe(EventKind::OpenTowerInfo, move |event| {
            info!(window = %id, tower = %event.tower_id(), "tower info loaded");
            lock(&sink).load(event.tower_id().clone(), Some(event));
        });

        Self {
            window,
            state,
            channel,
            opener: tokio::sync::Mutex::new(opener),
        }
    }

    /// The "Start Monitoring" button: show the monitor for the tower on
    /// display.
    ///
    /// A monitor that is already open is reused through its window target.
    /// Returns `Ok(None)` when no tower is loaded or the view has no opener.
    pub async fn start_monitoring(&self) -> Result<Option<ShowOutcome>, ShowError> {
        let tower = lock(&self.state).tower.clone();
        let Some(tower) = tower else {
            debug!(window = %self.window, "no tower loaded, nothing to monitor");
            return Ok(None);
        };
        let mut opener = self.opener.lock().await;
        let Some(coordinator) = opener.as_mut() else {
            warn!(window = %self.window, "view cannot open windows");
            return Ok(None);
        };
        info!(window = %self.window, tower = %tower, "start monitoring requested");
        coordinator
            .request_show(WindowRole::Monitor, Some(tower))
            .await
            .map(Some)
    }

    /// Deliver the opener's pending events and release it.
    async fn shutdown_opener(&self) {
        if let Some(coordinator) = self.opener.lock().await.take() {
            coordinator.shutdown().await;
        }
    }
}

// =============================================================================
// MONITOR
// =============================================================================

/// Live monitor. Remembers the last monitored tower across sessions.
pub struct MonitorView {
    window: WindowId,
    state: SharedState,
    channel: Channel,
}

impl MonitorView {
    pub fn open(
        window: WindowId,
        url: &str,
        hub: &ChannelHub,
        channel_name: &str,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let state = SharedState::default();
        let initial = parse_launch_tower_id(url)
            .or_else(|| store.get(ACTIVE_TOWER_KEY).map(TowerId::new));
        if let Some(tower) = initial {
            start_monitoring(&window, &state, store.as_ref(), tower, None);
        }

        let channel = hub.open(channel_name);
        // Both kinds restart monitoring, so a sender that only announces
        // tower info still moves the monitor along.
        for kind in [EventKind::StartMonitoring, EventKind::OpenTowerInfo] {
            let sink = Arc::clone(&state);
            let store = Arc::clone(&store);
            let id = window.clone();
            channel.subscribe(kind, move |event| {
                let tower = event.tower_id().clone();
                start_monitoring(&id, &sink, store.as_ref(), tower, Some(event));
            });
        }

        Self {
            window,
            state,
            channel,
        }
    }
}

fn start_monitoring(
    window: &WindowId,
    state: &SharedState,
    store: &dyn KeyValueStore,
    tower: TowerId,
    event: Option<&Event>,
) {
    if let Err(e) = store.set(ACTIVE_TOWER_KEY, tower.as_str()) {
        warn!(%window, "failed to remember active tower: {e}");
    }
    info!(%window, tower = %tower, "monitoring started");
    lock(state).load(tower, event);
}

// =============================================================================
// CONSOLE
// =============================================================================

/// Operations console. Listens to nothing.
pub struct ConsoleView {
    window: WindowId,
    channel: Channel,
}

impl ConsoleView {
    pub fn open(window: WindowId, hub: &ChannelHub, channel_name: &str) -> Self {
        Self {
            window,
            channel: hub.open(channel_name),
        }
    }
}

// =============================================================================
// VIEW BOARD
// =============================================================================

pub enum View {
    Info(Arc<TowerInfoView>),
    Monitor(MonitorView),
    Console(ConsoleView),
}

impl View {
    pub fn role(&self) -> WindowRole {
        match self {
            Self::Info(_) => WindowRole::Info,
            Self::Monitor(_) => WindowRole::Monitor,
            Self::Console(_) => WindowRole::Console,
        }
    }

    pub fn window(&self) -> &WindowId {
        match self {
            Self::Info(v) => &v.window,
            Self::Monitor(v) => &v.window,
            Self::Console(v) => &v.window,
        }
    }

    fn channel(&self) -> &Channel {
        match self {
            Self::Info(v) => &v.channel,
            Self::Monitor(v) => &v.channel,
            Self::Console(v) => &v.channel,
        }
    }

    pub fn summary(&self) -> ViewSummary {
        let (tower, loads, last_event_at) = match self {
            Self::Info(view) => {
                let state = lock(&view.state);
                (state.tower.clone(), state.loads, state.last_event_at)
            }
            Self::Monitor(view) => {
                let state = lock(&view.state);
                (state.tower.clone(), state.loads, state.last_event_at)
            }
            Self::Console(_) => (None, 0, None),
        };
        ViewSummary {
            window: self.window().to_string(),
            role: self.role(),
            tower,
            loads,
            last_event_at,
            open: !self.channel().is_closed(),
        }
    }
}

/// Every controller created during a session, keyed by window.
#[derive(Clone)]
pub struct ViewBoard {
    hub: ChannelHub,
    config: CoordinatorConfig,
    store: Arc<dyn KeyValueStore>,
    host: SimulatedHost,
    displays: Arc<dyn DisplayProvider>,
    // Detached views stay listed so the session report shows every window
    // that was opened. Emptied by `release`.
    views: Arc<Mutex<Vec<View>>>,
}

impl ViewBoard {
    pub fn new(
        hub: ChannelHub,
        config: CoordinatorConfig,
        store: Arc<dyn KeyValueStore>,
        host: SimulatedHost,
        displays: Arc<dyn DisplayProvider>,
    ) -> Self {
        Self {
            hub,
            config,
            store,
            host,
            displays,
            views: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn views(&self) -> MutexGuard<'_, Vec<View>> {
        self.views.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Create the controller for a window the host just opened.
    pub fn attach(&self, request: &OpenRequest, window: &WindowId) {
        let window = window.clone();
        let channel_name = self.config.channel.name.as_str();
        let view = match request.role {
            WindowRole::Info => {
                let opener = WindowCoordinator::new(
                    self.config.clone(),
                    &self.hub,
                    Box::new(self.host.clone()),
                    Arc::clone(&self.displays),
                    Arc::clone(&self.store),
                );
                View::Info(Arc::new(TowerInfoView::open(
                    window,
                    &request.url,
                    &self.hub,
                    channel_name,
                    Some(opener),
                )))
            }
            WindowRole::Monitor => View::Monitor(MonitorView::open(
                window,
                &request.url,
                &self.hub,
                channel_name,
                Arc::clone(&self.store),
            )),
            WindowRole::Console => {
                View::Console(ConsoleView::open(window, &self.hub, channel_name))
            }
        };
        debug!(role = %view.role(), window = %view.window(), "view attached");
        self.views().push(view);
    }

    /// Release the endpoint of a window that went away.
    pub fn detach(&self, window: &WindowId) {
        if let Some(view) = self.views().iter().find(|v| v.window() == window) {
            view.channel().close();
        }
    }

    /// The most recently attached, still-open view for `role`.
    pub fn current(&self, role: WindowRole) -> Option<ViewSummary> {
        self.views()
            .iter()
            .rev()
            .find(|v| v.role() == role && !v.channel().is_closed())
            .map(View::summary)
    }

    /// The most recently attached, still-open tower info view.
    pub fn info_view(&self) -> Option<Arc<TowerInfoView>> {
        self.views().iter().rev().find_map(|v| match v {
            View::Info(info) if !info.channel.is_closed() => Some(Arc::clone(info)),
            _ => None,
        })
    }

    pub fn summaries(&self) -> Vec<ViewSummary> {
        self.views().iter().map(View::summary).collect()
    }

    /// Close every view and return their final summaries.
    ///
    /// Openers owned by views are shut down first, so their pending events
    /// still go out.
    pub async fn release(&self) -> Vec<ViewSummary> {
        let views = std::mem::take(&mut *self.views());
        let mut summaries = Vec::with_capacity(views.len());
        for view in views {
            summaries.push(view.summary());
            if let View::Info(info) = &view {
                info.shutdown_opener().await;
            }
            view.channel().close();
        }
        debug!(released = summaries.len(), "views released");
        summaries
    }
}
