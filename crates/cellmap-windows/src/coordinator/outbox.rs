//! Ordered, optionally delayed dispatch of outbound events.
//!
//! One task drains a FIFO of scheduled sends. Each entry waits until its
//! delivery instant before going out, and entries never overtake each
//! other: an immediate send queued behind a grace-delayed one leaves after
//! it.

use std::time::Duration;

use cellmap_common::{EventKind, TowerPayload};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::channel::ChannelSender;

#[derive(Debug)]
struct Scheduled {
    deliver_at: Instant,
    kind: EventKind,
    payload: TowerPayload,
}

pub(crate) struct Outbox {
    tx: mpsc::UnboundedSender<Scheduled>,
    task: JoinHandle<()>,
}

impl Outbox {
    /// Start the dispatch task. Must be called inside a Tokio runtime.
    pub(crate) fn spawn(sender: ChannelSender) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drain(rx, sender));
        Self { tx, task }
    }

    pub(crate) fn send_now(&self, kind: EventKind, payload: TowerPayload) {
        self.schedule(Instant::now(), kind, payload);
    }

    pub(crate) fn send_after(&self, delay: Duration, kind: EventKind, payload: TowerPayload) {
        self.schedule(Instant::now() + delay, kind, payload);
    }

    fn schedule(&self, deliver_at: Instant, kind: EventKind, payload: TowerPayload) {
        let entry = Scheduled {
            deliver_at,
            kind,
            payload,
        };
        if self.tx.send(entry).is_err() {
            warn!(%kind, "outbox task has stopped, event dropped");
        }
    }

    /// Deliver everything still queued, then stop the task.
    pub(crate) async fn flush(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!("outbox task ended abnormally: {e}");
        }
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<Scheduled>, sender: ChannelSender) {
    while let Some(entry) = rx.recv().await {
        sleep_until(entry.deliver_at).await;
        let receivers = sender.send(entry.kind, entry.payload);
        debug!(
            channel = %sender.name(),
            kind = %entry.kind,
            receivers,
            "event dispatched"
        );
    }
}
