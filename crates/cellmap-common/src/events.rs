//! The event contract exchanged between windows over the channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::TowerId;

/// Kinds of cross-window events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Show (or re-render) the detail view for a tower.
    OpenTowerInfo,
    /// (Re)start the live monitor for a tower.
    StartMonitoring,
    /// A kind this build does not know. Receivers ignore it.
    #[serde(other)]
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OpenTowerInfo => "open_tower_info",
            EventKind::StartMonitoring => "start_monitoring",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by both event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerPayload {
    pub tower_id: TowerId,
}

impl TowerPayload {
    pub fn new(tower_id: impl Into<TowerId>) -> Self {
        Self {
            tower_id: tower_id.into(),
        }
    }
}

/// A sent event. Immutable: fields are only readable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    kind: EventKind,
    payload: TowerPayload,
    sent_at: DateTime<Utc>,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(kind: EventKind, payload: TowerPayload) -> Self {
        Self {
            kind,
            payload,
            sent_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn tower_id(&self) -> &TowerId {
        &self.payload.tower_id
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!(kind = %self.kind, "failed to serialize event: {e}");
            "null".to_string()
        })
    }

    /// Parse the JSON wire form. Returns `None` for malformed bodies.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
