use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use cellmap_common::{Event, EventKind};

pub(crate) type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Ordered callbacks per event kind. Append-only.
#[derive(Default)]
pub(crate) struct Listeners {
    by_kind: Mutex<HashMap<EventKind, Vec<Callback>>>,
}

impl Listeners {
    // A panic elsewhere while holding the lock cannot leave the map half
    // written, so a poisoned lock is still safe to use.
    fn by_kind(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Callback>>> {
        self.by_kind.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub(crate) fn add(&self, kind: EventKind, callback: Callback) {
        self.by_kind().entry(kind).or_default().push(callback);
    }

    /// Invoke every callback for the event's kind in registration order.
    ///
    /// The list is cloned out first so callbacks may subscribe further
    /// handlers without deadlocking. Returns how many callbacks ran.
    pub(crate) fn dispatch(&self, event: &Event) -> usize {
        let callbacks = self.by_kind().get(&event.kind()).cloned().unwrap_or_default();
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.by_kind().get(&kind).map_or(0, Vec::len)
    }
}
