//! Named publish/subscribe channel shared by the windows of one session.
//!
//! A [`ChannelHub`] keeps, per channel name, the inbox of every endpoint
//! opened on it. Every window opens its own [`Channel`] endpoint on the hub;
//! a message sent from one endpoint is queued on every *other* endpoint's
//! inbox on the same name, never echoed back to the sender. Messages travel
//! as JSON and each endpoint parses them on receipt, so a malformed or
//! unknown message only affects the endpoint that drops it.
//!
//! Inboxes are unbounded: an endpoint that falls behind a burst catches up
//! without losing messages. Per-sender order is preserved, nothing is
//! acknowledged, and a message sent while nobody listens is lost.

mod listeners;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use cellmap_common::{Event, EventKind, TowerPayload};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use listeners::Listeners;

/// Inbox of one endpoint.
struct Inbox {
    origin: Uuid,
    tx: mpsc::UnboundedSender<Arc<str>>,
}

/// Every open endpoint on one channel name.
#[derive(Clone, Default)]
struct Bus {
    inboxes: Arc<Mutex<Vec<Inbox>>>,
}

impl Bus {
    fn inboxes(&self) -> MutexGuard<'_, Vec<Inbox>> {
        self.inboxes.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Queue `body` on every inbox except the sender's. Inboxes whose
    /// endpoint has gone away are dropped on the way.
    fn fan_out(&self, origin: Uuid, body: &Arc<str>) -> usize {
        let mut delivered = 0;
        self.inboxes().retain(|inbox| {
            if inbox.origin == origin {
                return true;
            }
            match inbox.tx.send(Arc::clone(body)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    fn leave(&self, origin: Uuid) {
        self.inboxes().retain(|inbox| inbox.origin != origin);
    }

    fn len(&self) -> usize {
        self.inboxes().len()
    }
}

/// Process-wide registry of named buses.
#[derive(Clone, Default)]
pub struct ChannelHub {
    buses: Arc<Mutex<HashMap<String, Bus>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an endpoint on the named channel.
    ///
    /// The endpoint is subscribed before this returns, so it observes every
    /// message sent afterwards. Must be called inside a Tokio runtime.
    pub fn open(&self, name: &str) -> Channel {
        let bus = self.bus(name);
        let (tx, rx) = mpsc::unbounded_channel();
        let origin = Uuid::new_v4();
        bus.inboxes().push(Inbox { origin, tx });

        let closed = Arc::new(AtomicBool::new(false));
        let listeners = Arc::new(Listeners::default());
        let name: Arc<str> = Arc::from(name);

        let task = tokio::spawn(pump(
            rx,
            Arc::clone(&listeners),
            Arc::clone(&closed),
            Arc::clone(&name),
        ));

        debug!(channel = %name, endpoint = %origin, "channel endpoint opened");

        Channel {
            sender: ChannelSender {
                name,
                origin,
                bus,
                closed,
            },
            listeners,
            task,
        }
    }

    /// Number of open endpoints on `name`.
    pub fn endpoint_count(&self, name: &str) -> usize {
        self.buses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .map_or(0, Bus::len)
    }

    fn bus(&self, name: &str) -> Bus {
        let mut buses = self.buses.lock().unwrap_or_else(|p| p.into_inner());
        buses.entry(name.to_string()).or_default().clone()
    }
}

/// Send half of an endpoint. Cloneable so delayed sends can run on their
/// own task; all clones share the endpoint's closed state.
#[derive(Clone)]
pub struct ChannelSender {
    name: Arc<str>,
    origin: Uuid,
    bus: Bus,
    closed: Arc<AtomicBool>,
}

impl ChannelSender {
    /// Send `{kind, payload, sentAt: now}` to every other endpoint.
    ///
    /// Returns how many other endpoints the event was queued for; 0 means
    /// it was dropped. Nothing is sent once the endpoint is closed.
    pub fn send(&self, kind: EventKind, payload: TowerPayload) -> usize {
        if self.is_closed() {
            debug!(channel = %self.name, %kind, "send on closed channel ignored");
            return 0;
        }
        let event = Event::new(kind, payload);
        self.post(event.to_json())
    }

    pub(crate) fn post(&self, body: String) -> usize {
        self.bus.fan_out(self.origin, &Arc::from(body))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One window's endpoint on a named channel.
pub struct Channel {
    sender: ChannelSender,
    listeners: Arc<Listeners>,
    task: JoinHandle<()>,
}

impl Channel {
    pub fn name(&self) -> &str {
        self.sender.name()
    }

    /// Register a callback for `kind`. Callbacks run in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.add(kind, Arc::new(callback));
    }

    /// Number of callbacks registered for `kind` on this endpoint.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    /// See [`ChannelSender::send`].
    pub fn send(&self, kind: EventKind, payload: TowerPayload) -> usize {
        self.sender.send(kind, payload)
    }

    pub fn sender(&self) -> ChannelSender {
        self.sender.clone()
    }

    /// Release the endpoint. No sends or deliveries happen afterwards.
    pub fn close(&self) {
        if !self.sender.closed.swap(true, Ordering::AcqRel) {
            self.sender.bus.leave(self.sender.origin);
            self.task.abort();
            debug!(channel = %self.sender.name, endpoint = %self.sender.origin, "channel endpoint closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn pump(
    mut rx: mpsc::UnboundedReceiver<Arc<str>>,
    listeners: Arc<Listeners>,
    closed: Arc<AtomicBool>,
    name: Arc<str>,
) {
    while let Some(body) = rx.recv().await {
        if closed.load(Ordering::Acquire) {
            break;
        }
        match Event::from_json(&body) {
            Some(event) if event.kind() == EventKind::Unknown => {
                debug!(channel = %name, "ignoring event of unknown kind");
            }
            Some(event) => {
                let handled = listeners.dispatch(&event);
                debug!(channel = %name, kind = %event.kind(), handled, "event delivered");
            }
            None => {
                warn!(
                    channel = %name,
                    body_len = body.len(),
                    "dropping malformed channel message"
                );
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn record(channel: &Channel, kind: EventKind) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        channel.subscribe(kind, move |event| {
            let _ = tx.send(event.clone());
        });
        rx
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("listener dropped")
    }

    #[tokio::test]
    async fn delivers_to_other_endpoints() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let info = hub.open("towers");
        let mut rx = record(&info, EventKind::OpenTowerInfo);

        let receivers = map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-001"));
        assert_eq!(receivers, 1);

        let event = next(&mut rx).await;
        assert_eq!(event.kind(), EventKind::OpenTowerInfo);
        assert_eq!(event.tower_id().as_str(), "T-001");
    }

    #[tokio::test]
    async fn sender_does_not_receive_its_own_message() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let other = hub.open("towers");
        let mut own = record(&map, EventKind::OpenTowerInfo);
        let mut theirs = record(&other, EventKind::OpenTowerInfo);

        map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-001"));
        next(&mut theirs).await;

        tokio::task::yield_now().await;
        assert!(own.try_recv().is_err());
    }

    #[tokio::test]
    async fn preserves_send_order() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let monitor = hub.open("towers");
        let mut rx = record(&monitor, EventKind::StartMonitoring);

        for n in 0..10 {
            map.send(EventKind::StartMonitoring, TowerPayload::new(format!("T-{n}")));
        }
        for n in 0..10 {
            assert_eq!(next(&mut rx).await.tower_id().as_str(), format!("T-{n}"));
        }
    }

    #[tokio::test]
    async fn callbacks_fire_in_registration_order_once_each() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let info = hub.open("towers");
        let (tx, mut rx) = mpsc::unbounded_channel();
        for n in 0..3 {
            let tx = tx.clone();
            info.subscribe(EventKind::OpenTowerInfo, move |_| {
                let _ = tx.send(n);
            });
        }

        map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-001"));

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap());
        }
        assert_eq!(seen, vec![0, 1, 2]);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn names_are_isolated() {
        let hub = ChannelHub::default();
        let a = hub.open("towers");
        let b = hub.open("other");
        assert_eq!(a.send(EventKind::OpenTowerInfo, TowerPayload::new("T-1")), 0);
        assert_eq!(b.listener_count(EventKind::OpenTowerInfo), 0);
    }

    #[tokio::test]
    async fn send_without_listeners_is_dropped_silently() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        assert_eq!(map.send(EventKind::StartMonitoring, TowerPayload::new("T-1")), 0);
    }

    #[tokio::test]
    async fn closed_endpoint_neither_sends_nor_receives() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let info = hub.open("towers");
        let mut rx = record(&info, EventKind::OpenTowerInfo);

        info.close();
        assert!(info.is_closed());
        map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-1"));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        map.close();
        assert_eq!(map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-2")), 0);
    }

    #[tokio::test]
    async fn malformed_and_unknown_messages_are_skipped() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let info = hub.open("towers");
        let mut rx = record(&info, EventKind::OpenTowerInfo);

        map.sender().post("{not json".to_string());
        map.sender().post(
            r#"{"kind":"close_all","payload":{"towerId":"x"},"sentAt":"2024-01-01T00:00:00Z"}"#
                .to_string(),
        );
        map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-9"));

        assert_eq!(next(&mut rx).await.tower_id().as_str(), "T-9");
    }

    #[tokio::test]
    async fn burst_is_delivered_in_full_and_in_order() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let monitor = hub.open("towers");
        let mut rx = record(&monitor, EventKind::StartMonitoring);

        // Queued before the receiving task gets a chance to run.
        for n in 0..500 {
            assert_eq!(
                map.send(EventKind::StartMonitoring, TowerPayload::new(format!("T-{n}"))),
                1
            );
        }
        for n in 0..500 {
            assert_eq!(next(&mut rx).await.tower_id().as_str(), format!("T-{n}"));
        }
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_endpoint_receives_the_whole_burst() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let info = hub.open("towers");
        let monitor = hub.open("towers");
        let mut info_rx = record(&info, EventKind::OpenTowerInfo);
        let mut monitor_rx = record(&monitor, EventKind::OpenTowerInfo);

        for n in 0..6 {
            assert_eq!(map.send(EventKind::OpenTowerInfo, TowerPayload::new(format!("T-{n}"))), 2);
        }
        for n in 0..6 {
            assert_eq!(next(&mut info_rx).await.tower_id().as_str(), format!("T-{n}"));
            assert_eq!(next(&mut monitor_rx).await.tower_id().as_str(), format!("T-{n}"));
        }
    }

    #[tokio::test]
    async fn closed_and_dropped_endpoints_leave_the_bus() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let info = hub.open("towers");
        let monitor = hub.open("towers");
        assert_eq!(hub.endpoint_count("towers"), 3);

        info.close();
        drop(monitor);
        assert_eq!(hub.endpoint_count("towers"), 1);
        assert_eq!(map.send(EventKind::OpenTowerInfo, TowerPayload::new("T-1")), 0);
        assert_eq!(hub.endpoint_count("other"), 0);
    }

    #[tokio::test]
    async fn cloned_sender_shares_closed_state() {
        let hub = ChannelHub::default();
        let map = hub.open("towers");
        let sender = map.sender();
        assert_eq!(sender.name(), "towers");
        map.close();
        assert!(sender.is_closed());
    }
}
