use cellmap_common::{WindowId, WindowRole};

use crate::host::AuxWindow;

/// An opened auxiliary window together with its role.
///
/// Owned by exactly one registry entry. Not `Clone`: other code refers to a
/// window by its [`WindowId`].
pub struct WindowHandle {
    role: WindowRole,
    url: String,
    window: Box<dyn AuxWindow>,
}

impl WindowHandle {
    pub fn new(role: WindowRole, url: impl Into<String>, window: Box<dyn AuxWindow>) -> Self {
        Self {
            role,
            url: url.into(),
            window,
        }
    }

    pub fn role(&self) -> WindowRole {
        self.role
    }

    pub fn id(&self) -> &WindowId {
        self.window.id()
    }

    /// The launch URL the window was opened with.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.window.is_closed()
    }

    pub fn focus(&self) {
        self.window.focus();
    }

    pub fn close(&self) {
        self.window.close();
    }
}

impl std::fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandle")
            .field("role", &self.role)
            .field("id", self.id())
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish()
    }
}
