//! The browser boundary as a trait.
//!
//! The host provides tab enumeration, muting, removal, and local
//! notifications. A real adapter (extension shell, automation driver)
//! implements [`TabHost`]; [`MemoryHost`] is the in-memory reference
//! implementation used by the CLI driver and by tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TabId = u64;

/// A host tab as seen by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub active: bool,
    pub muted: bool,
    /// Last access timestamp in epoch milliseconds; 0 when unknown.
    pub last_accessed_ms: u64,
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("tab {0} is gone")]
    TabGone(TabId),
    #[error("host backend error: {0}")]
    Backend(String),
}

/// Host-provided browser operations consumed by the coordinator.
///
/// Implementations are expected to be forgiving: a mutation against a tab
/// that already closed should surface as [`HostError::TabGone`], which the
/// coordinator logs and ignores.
pub trait TabHost {
    /// Snapshot of all open tabs.
    fn tabs(&self) -> Vec<Tab>;

    /// Mute or unmute a tab.
    fn set_muted(&mut self, id: TabId, muted: bool) -> Result<(), HostError>;

    /// Close a tab.
    fn close(&mut self, id: TabId) -> Result<(), HostError>;

    /// Show a local notification.
    fn notify(&mut self, title: &str, message: &str) -> Result<(), HostError>;
}

/// In-memory tab host.
///
/// Records closures and notifications so tests can assert on the effects
/// the coordinator applied.
#[derive(Debug, Default)]
pub struct MemoryHost {
    tabs: Vec<Tab>,
    pub closed: Vec<TabId>,
    pub notifications: Vec<(String, String)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tab and return its id.
    pub fn add_tab(&mut self, url: &str, active: bool, last_accessed_ms: u64) -> TabId {
        let id = self.tabs.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        if active {
            for tab in &mut self.tabs {
                tab.active = false;
            }
        }
        self.tabs.push(Tab {
            id,
            url: url.to_string(),
            active,
            muted: false,
            last_accessed_ms,
        });
        id
    }

    /// Mark a tab as the active one.
    pub fn activate(&mut self, id: TabId) {
        for tab in &mut self.tabs {
            tab.active = tab.id == id;
        }
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    fn tab_mut(&mut self, id: TabId) -> Result<&mut Tab, HostError> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(HostError::TabGone(id))
    }
}

impl TabHost for MemoryHost {
    fn tabs(&self) -> Vec<Tab> {
        self.tabs.clone()
    }

    fn set_muted(&mut self, id: TabId, muted: bool) -> Result<(), HostError> {
        self.tab_mut(id)?.muted = muted;
        Ok(())
    }

    fn close(&mut self, id: TabId) -> Result<(), HostError> {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.id != id);
        if self.tabs.len() == before {
            return Err(HostError::TabGone(id));
        }
        self.closed.push(id);
        Ok(())
    }

    fn notify(&mut self, title: &str, message: &str) -> Result<(), HostError> {
        self.notifications
            .push((title.to_string(), message.to_string()));
        Ok(())
    }
}
