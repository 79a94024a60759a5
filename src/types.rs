//! Core types for tmux integration
//!
//! These types mirror tmux's server-side objects as seen through control
//! mode and are the snapshots exposed to the UI layer.

pub use par_term_config::{PaneId, TabId};

/// tmux window ID (e.g., @0, @1)
pub type TmuxWindowId = u64;

/// tmux pane ID (e.g., %0, %1)
pub type TmuxPaneId = u64;

/// tmux session ID (e.g., $0, $1)
pub type TmuxSessionId = u64;

/// A tmux window (corresponds to a par-term tab)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window ID (e.g., @0)
    pub window_id: TmuxWindowId,
    /// Currently active pane, if known
    pub pane_id: Option<TmuxPaneId>,
    /// Window name (free text, may contain tabs and spaces)
    pub name: String,
}

impl WindowInfo {
    /// Create a window entry
    pub fn new(
        window_id: TmuxWindowId,
        pane_id: Option<TmuxPaneId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            window_id,
            pane_id,
            name: name.into(),
        }
    }
}

/// A row of `list-sessions` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session name (may contain colons)
    pub name: String,
    /// Number of windows in the session
    pub window_count: usize,
    /// Whether a client is attached to this session
    pub is_attached: bool,
}

/// Lifecycle of a control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Launch command written, waiting for the first session notification
    Connecting,
    /// `%session-changed` received, notifications are flowing
    Connected,
    /// `%exit` received or the connection was torn down
    Ended,
}
