//! End-to-end scenarios: a coordinator driving simulated windows, with
//! listeners on separate channel endpoints standing in for the auxiliary
//! windows.

use std::sync::Arc;
use std::time::Duration;

use cellmap_common::{Event, EventKind, PlacementError, Rect, TowerId, WindowRole};
use cellmap_config::{CoordinatorConfig, KeyValueStore, MemoryStore, PREFER_SECONDARY_KEY};
use cellmap_windows::sim::{SimulatedDisplays, SimulatedHost};
use cellmap_windows::{
    Channel, ChannelHub, PlacementStrategy, RoleState, ShowOutcome, WindowCoordinator,
};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

const MAP_BOUNDS: Rect = Rect {
    x: 100,
    y: 50,
    width: 1200,
    height: 800,
};

struct Session {
    hub: ChannelHub,
    host: SimulatedHost,
    store: MemoryStore,
    coordinator: WindowCoordinator,
}

impl Session {
    fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    fn with_store(store: MemoryStore) -> Self {
        let hub = ChannelHub::default();
        let host = SimulatedHost::new(MAP_BOUNDS);
        let coordinator = coordinator(&hub, &host, &store);
        Self {
            hub,
            host,
            store,
            coordinator,
        }
    }

    /// An endpoint recording every event of `kinds` it receives.
    fn listener(&self, kinds: &[EventKind]) -> (Channel, mpsc::UnboundedReceiver<Event>) {
        let endpoint = self.hub.open(&CoordinatorConfig::default().channel.name);
        let (tx, rx) = mpsc::unbounded_channel();
        for kind in kinds {
            let tx = tx.clone();
            endpoint.subscribe(*kind, move |event| {
                let _ = tx.send(event.clone());
            });
        }
        (endpoint, rx)
    }
}

fn coordinator(hub: &ChannelHub, host: &SimulatedHost, store: &MemoryStore) -> WindowCoordinator {
    WindowCoordinator::new(
        CoordinatorConfig::default(),
        hub,
        Box::new(host.clone()),
        Arc::new(SimulatedDisplays::dual()),
        Arc::new(store.clone()),
    )
}

/// Everything delivered once all pending dispatches have settled.
async fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    sleep(Duration::from_secs(1)).await;
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn showing_an_open_window_twice_reuses_it_and_sends_twice() {
    let mut session = Session::new();
    let (_info, mut rx) = session.listener(&[EventKind::OpenTowerInfo]);

    let first = session
        .coordinator
        .request_show(WindowRole::Info, Some(TowerId::from("T-001")))
        .await
        .unwrap();
    let second = session
        .coordinator
        .request_show(WindowRole::Info, Some(TowerId::from("T-001")))
        .await
        .unwrap();

    assert!(matches!(first, ShowOutcome::Opened { .. }));
    assert!(matches!(second, ShowOutcome::Focused { .. }));
    assert_eq!(first.window(), second.window());
    assert_eq!(session.host.created_count(), 1);
    assert_eq!(drain(&mut rx).await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn closed_window_is_detected_and_replaced() {
    let mut session = Session::new();

    let first = session
        .coordinator
        .request_show(WindowRole::Monitor, Some(TowerId::from("T-002")))
        .await
        .unwrap();
    assert_eq!(session.coordinator.role_state(WindowRole::Monitor), RoleState::Open);

    session.host.close_window(first.window());
    assert_eq!(session.coordinator.role_state(WindowRole::Monitor), RoleState::Stale);

    let second = session
        .coordinator
        .request_show(WindowRole::Monitor, Some(TowerId::from("T-002")))
        .await
        .unwrap();

    assert!(matches!(second, ShowOutcome::Opened { reopened: true, .. }));
    assert_ne!(first.window(), second.window());
    assert_eq!(session.coordinator.role_state(WindowRole::Monitor), RoleState::Open);
    assert_eq!(session.host.live_count(WindowRole::Monitor), 1);
}

#[tokio::test(start_paused = true)]
async fn broadcast_sends_both_events_without_windows() {
    let session = Session::new();
    let (_listener, mut rx) =
        session.listener(&[EventKind::OpenTowerInfo, EventKind::StartMonitoring]);

    session.coordinator.broadcast_update(&TowerId::from("T-042"));

    let events = drain(&mut rx).await;
    let kinds: Vec<_> = events.iter().map(Event::kind).collect();
    assert_eq!(kinds, vec![EventKind::OpenTowerInfo, EventKind::StartMonitoring]);
    assert!(events.iter().all(|e| e.tower_id().as_str() == "T-042"));
    assert_eq!(session.host.created_count(), 0);
}

#[tokio::test]
async fn failed_queries_fall_back_to_clamped_coordinates() {
    // (anchor, near the map, beside the map)
    let cases = [
        (Rect::new(-2500, -300, 1200, 800), (0, 0), (0, 0)),
        (Rect::new(0, 0, 1200, 800), (40, 40), (1220, 0)),
        (Rect::new(-1200, 400, 1000, 600), (0, 440), (0, 400)),
    ];
    let providers = [
        SimulatedDisplays::dual().with_permission(Err(PlacementError::QueryFailed("x".into()))),
        SimulatedDisplays::dual()
            .with_permission(Err(PlacementError::Unsupported("no api".into()))),
        SimulatedDisplays::dual().with_details(Err(PlacementError::QueryFailed("y".into()))),
    ];

    for (n, displays) in providers.into_iter().enumerate() {
        let strategy = PlacementStrategy::new(Default::default(), Arc::new(displays));
        for (anchor, near, beside) in cases {
            let placement = strategy.compute(anchor, 600, 700, false).await;
            assert_eq!((placement.left, placement.top), near, "provider {n}, {anchor:?}");

            let placement = strategy.compute(anchor, 600, 700, true).await;
            assert_eq!((placement.left, placement.top), beside, "provider {n}, {anchor:?}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn preference_round_trips_through_storage() {
    let store = MemoryStore::new();
    let mut session = Session::with_store(store.clone());

    session.coordinator.set_prefer_secondary(true).unwrap();
    let reloaded = coordinator(&session.hub, &session.host, &store);
    assert!(reloaded.prefer_secondary());

    session.coordinator.set_prefer_secondary(false).unwrap();
    assert_eq!(session.store.get_bool(PREFER_SECONDARY_KEY), Some(false));
    let reloaded = coordinator(&session.hub, &session.host, &store);
    assert!(!reloaded.prefer_secondary());
}

#[tokio::test(start_paused = true)]
async fn info_window_launch_and_grace_delivery() {
    let mut session = Session::new();
    let (_info, mut rx) = session.listener(&[EventKind::OpenTowerInfo]);
    let start = Instant::now();

    session
        .coordinator
        .request_show(WindowRole::Info, Some(TowerId::from("T-001")))
        .await
        .unwrap();

    let windows = session.host.windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].url, "tower-info.html?towerId=T-001");

    let event = rx.recv().await.unwrap();
    assert_eq!(event.kind(), EventKind::OpenTowerInfo);
    assert_eq!(event.tower_id().as_str(), "T-001");
    let grace = CoordinatorConfig::default().timing.grace_period();
    assert!(start.elapsed() >= grace);
    assert!(start.elapsed() < grace + Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn monitor_kept_open_receives_each_request() {
    let mut session = Session::new();
    let (_monitor, mut rx) = session.listener(&[EventKind::StartMonitoring]);

    for _ in 0..2 {
        session
            .coordinator
            .request_show(WindowRole::Monitor, Some(TowerId::from("T-002")))
            .await
            .unwrap();
    }

    let events = drain(&mut rx).await;
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| e.kind() == EventKind::StartMonitoring && e.tower_id().as_str() == "T-002"));
    assert_eq!(session.host.created_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn events_arrive_in_send_order_across_grace_delay() {
    let mut session = Session::new();
    let (_monitor, mut rx) = session.listener(&[EventKind::StartMonitoring]);

    session
        .coordinator
        .request_show(WindowRole::Monitor, Some(TowerId::from("A")))
        .await
        .unwrap();
    session
        .coordinator
        .request_show(WindowRole::Monitor, Some(TowerId::from("B")))
        .await
        .unwrap();
    session.coordinator.broadcast_update(&TowerId::from("C"));

    let ids: Vec<String> = drain(&mut rx)
        .await
        .iter()
        .map(|e| e.tower_id().as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn blocked_popup_then_allowed() {
    let mut session = Session::new();
    session.host.set_block_popups(true);
    assert!(session
        .coordinator
        .request_show(WindowRole::Console, None)
        .await
        .is_err());

    session.host.set_block_popups(false);
    let outcome = session
        .coordinator
        .request_show(WindowRole::Console, None)
        .await
        .unwrap();
    assert!(matches!(outcome, ShowOutcome::Opened { reopened: false, .. }));
    assert_eq!(session.host.windows()[0].url, "console.html");
}

#[tokio::test(start_paused = true)]
async fn every_event_of_a_session_reaches_the_listener() {
    let mut session = Session::new();
    let (_listener, mut rx) =
        session.listener(&[EventKind::OpenTowerInfo, EventKind::StartMonitoring]);

    // open, focus, broadcast (two events), details (two events)
    session
        .coordinator
        .request_show(WindowRole::Info, Some(TowerId::from("T-1")))
        .await
        .unwrap();
    session
        .coordinator
        .request_show(WindowRole::Info, Some(TowerId::from("T-2")))
        .await
        .unwrap();
    session.coordinator.broadcast_update(&TowerId::from("T-3"));
    session
        .coordinator
        .open_tower_details(&TowerId::from("T-4"))
        .await
        .unwrap();

    let seen: Vec<(EventKind, String)> = drain(&mut rx)
        .await
        .iter()
        .map(|e| (e.kind(), e.tower_id().as_str().to_string()))
        .collect();
    let expected = vec![
        (EventKind::OpenTowerInfo, "T-1".to_string()),
        (EventKind::OpenTowerInfo, "T-2".to_string()),
        (EventKind::OpenTowerInfo, "T-3".to_string()),
        (EventKind::StartMonitoring, "T-3".to_string()),
        (EventKind::OpenTowerInfo, "T-4".to_string()),
        (EventKind::StartMonitoring, "T-4".to_string()),
    ];
    assert_eq!(seen, expected);
}

#[tokio::test(start_paused = true)]
async fn long_broadcast_burst_is_not_truncated() {
    let session = Session::new();
    let (_listener, mut rx) =
        session.listener(&[EventKind::OpenTowerInfo, EventKind::StartMonitoring]);

    for n in 0..150 {
        session.coordinator.broadcast_update(&TowerId::new(format!("T-{n}")));
    }

    let events = drain(&mut rx).await;
    assert_eq!(events.len(), 300);
    assert_eq!(events[298].tower_id().as_str(), "T-149");
}
