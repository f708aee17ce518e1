//! Per-role window registry.
//!
//! Holds at most one handle per role. Whether a stored handle still points
//! at a live window is only known by asking it, so staleness is detected
//! when the entry is next looked at.

use std::collections::BTreeMap;

use cellmap_common::WindowRole;
use tracing::debug;

use super::handle::WindowHandle;

/// Observed state of a role's registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// Never opened, or the stale handle was already discarded.
    Absent,
    Open,
    /// A handle is stored but its window has been closed.
    Stale,
}

#[derive(Debug, Default)]
pub struct WindowRegistry {
    entries: BTreeMap<WindowRole, WindowHandle>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, role: WindowRole) -> RoleState {
        match self.entries.get(&role) {
            None => RoleState::Absent,
            Some(handle) if handle.is_closed() => RoleState::Stale,
            Some(_) => RoleState::Open,
        }
    }

    /// The stored handle if its window is still open.
    pub fn live(&self, role: WindowRole) -> Option<&WindowHandle> {
        self.entries.get(&role).filter(|handle| !handle.is_closed())
    }

    /// Store a handle under its role, returning whatever it replaced.
    pub fn insert(&mut self, handle: WindowHandle) -> Option<WindowHandle> {
        self.entries.insert(handle.role(), handle)
    }

    /// Drop the entry for `role` if its window is closed. Returns true if
    /// something was discarded.
    pub fn prune_stale(&mut self, role: WindowRole) -> bool {
        if self.state(role) != RoleState::Stale {
            return false;
        }
        if let Some(handle) = self.entries.remove(&role) {
            debug!(%role, window = %handle.id(), "discarding stale window handle");
        }
        true
    }

    /// Roles whose window is currently open, in role order.
    pub fn open_roles(&self) -> Vec<WindowRole> {
        self.entries
            .iter()
            .filter(|(_, handle)| !handle.is_closed())
            .map(|(role, _)| *role)
            .collect()
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every live window and clear the registry. Returns how many
    /// windows were closed.
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (role, handle) in std::mem::take(&mut self.entries) {
            if !handle.is_closed() {
                handle.close();
                closed += 1;
                debug!(%role, window = %handle.id(), "window closed");
            }
        }
        closed
    }
}
