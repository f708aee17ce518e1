//! Scripted map session against simulated windows.
//!
//! Walks the towers the way a user clicking on the map would: view details,
//! open the monitor, start monitoring from the detail window, close and
//! reopen a window, open the console. Views are
//! attached as the host creates windows, so every event crosses the channel
//! to a real endpoint.

use std::sync::Arc;
use std::time::Duration;

use cellmap_common::{CellmapError, Rect, ShowError, TowerId, WindowRole};
use cellmap_config::{CoordinatorConfig, KeyValueStore};
use cellmap_windows::placement::NoDisplayQuery;
use cellmap_windows::sim::{SimulatedDisplays, SimulatedHost};
use cellmap_windows::{ChannelHub, DisplayProvider, WindowCoordinator};
use serde::Serialize;
use tracing::{info, warn};

use crate::views::{ViewBoard, ViewSummary};

/// Bounds of the simulated map window.
const MAP_BOUNDS: Rect = Rect {
    x: 120,
    y: 80,
    width: 1280,
    height: 820,
};

const SETTLE_MARGIN: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub towers: Vec<TowerId>,
    pub displays: usize,
    pub block_popups: bool,
    pub prefer_secondary: Option<bool>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            towers: vec![TowerId::from("NL-0001"), TowerId::from("NL-0002")],
            displays: 2,
            block_popups: false,
            prefer_secondary: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub prefer_secondary: bool,
    pub windows_created: usize,
    pub blocked: usize,
    pub open_roles: Vec<WindowRole>,
    pub views: Vec<ViewSummary>,
}

/// Simulated displays side by side, or none at all.
pub fn display_provider(count: usize) -> Arc<dyn DisplayProvider> {
    match count {
        0 => Arc::new(NoDisplayQuery),
        n => {
            let screens = (0..n)
                .map(|i| {
                    let x = i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(1920);
                    let label = format!("display-{}", i + 1);
                    SimulatedDisplays::screen(&label, Rect::new(x, 0, 1920, 1080))
                })
                .collect();
            Arc::new(SimulatedDisplays::with_screens(screens))
        }
    }
}

pub async fn run(
    config: CoordinatorConfig,
    store: Arc<dyn KeyValueStore>,
    options: SessionOptions,
) -> Result<SessionReport, CellmapError> {
    let hub = ChannelHub::new();
    let host = SimulatedHost::new(MAP_BOUNDS);
    host.set_block_popups(options.block_popups);

    let displays = display_provider(options.displays);
    let board = ViewBoard::new(
        hub.clone(),
        config.clone(),
        Arc::clone(&store),
        host.clone(),
        Arc::clone(&displays),
    );
    let attach = board.clone();
    host.set_on_open(Box::new(move |request, window| attach.attach(request, window)));

    // Long enough for grace-delayed events to reach every view.
    let settle = config.timing.grace_period() + SETTLE_MARGIN;
    let mut coordinator = WindowCoordinator::new(
        config,
        &hub,
        Box::new(host.clone()),
        displays,
        store,
    );

    if let Some(prefer) = options.prefer_secondary {
        coordinator.set_prefer_secondary(prefer)?;
    }

    let mut blocked = 0;

    for tower in &options.towers {
        info!(tower = %tower, "selecting tower");
        tally(coordinator.open_tower_details(tower).await, &mut blocked);
        tally(
            coordinator
                .request_show(WindowRole::Monitor, Some(tower.clone()))
                .await,
            &mut blocked,
        );
        tokio::time::sleep(settle).await;
    }

    // "Start Monitoring" in the detail window reuses the monitor already open.
    if let Some(info) = board.info_view() {
        tally(info.start_monitoring().await, &mut blocked);
        tokio::time::sleep(settle).await;
    }

    // The user closes the detail window and picks the first tower again.
    if let (Some(first), Some(handle)) = (
        options.towers.first(),
        coordinator.registry().live(WindowRole::Info),
    ) {
        let window = handle.id().clone();
        host.close_window(&window);
        board.detach(&window);
        info!(tower = %first, "detail window closed, reopening");
        tally(coordinator.open_tower_details(first).await, &mut blocked);
    }

    tally(
        coordinator.request_show(WindowRole::Console, None).await,
        &mut blocked,
    );

    if let Some(last) = options.towers.last() {
        coordinator.broadcast_update(last);
    }
    tokio::time::sleep(settle).await;

    for role in WindowRole::ALL {
        if let Some(view) = board.current(role) {
            info!(%role, window = %view.window, tower = ?view.tower, loads = view.loads, "view state");
        }
    }

    let report = SessionReport {
        prefer_secondary: coordinator.prefer_secondary(),
        windows_created: host.created_count(),
        blocked,
        open_roles: coordinator.registry().open_roles(),
        views: board.release().await,
    };
    coordinator.shutdown().await;
    Ok(report)
}

fn tally<T>(result: Result<T, ShowError>, blocked: &mut usize) {
    if let Err(e) = result {
        warn!("{e}");
        *blocked += 1;
    }
}
