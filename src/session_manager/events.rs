//! Events emitted to the UI layer.

use crate::layout::LayoutNode;
use crate::types::{
    PaneId, SessionInfo, TabId, TmuxPaneId, TmuxSessionId, TmuxWindowId, WindowInfo,
};

/// A change the UI layer should apply, produced by
/// `SessionManager::handle_notification`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A tab now backs a tmux window
    TabCreated {
        tab_id: TabId,
        window_id: TmuxWindowId,
        title: String,
    },
    /// The tab's window was closed; its panes are gone with it
    TabClosed {
        tab_id: TabId,
        window_id: TmuxWindowId,
    },
    /// The tab's window was renamed
    TabRenamed { tab_id: TabId, name: String },
    /// A tab's pane tree changed
    LayoutChanged(LayoutUpdate),
    /// Output for a mapped pane
    PaneOutput {
        tab_id: TabId,
        pane_id: PaneId,
        tmux_pane_id: TmuxPaneId,
        data: Vec<u8>,
    },
    /// A window's active pane changed
    ActivePaneChanged {
        tab_id: Option<TabId>,
        window_id: TmuxWindowId,
        tmux_pane_id: TmuxPaneId,
        pane_id: Option<PaneId>,
    },
    /// A pane entered or left a mode such as copy mode
    PaneModeChanged {
        tmux_pane_id: TmuxPaneId,
        pane_id: Option<PaneId>,
    },
    /// The attached session changed or was renamed
    SessionChanged {
        session_id: TmuxSessionId,
        name: String,
    },
    /// A session was created or destroyed somewhere on the server
    SessionsChanged,
    /// Fresh `list-windows` snapshot
    WindowsListed(Vec<WindowInfo>),
    /// Fresh `list-sessions` snapshot
    SessionsListed(Vec<SessionInfo>),
    /// tmux paused output for a pane
    PanePaused { tmux_pane_id: TmuxPaneId },
    /// tmux resumed output for a pane
    PaneResumed { tmux_pane_id: TmuxPaneId },
    /// The control connection is over; all state has been cleared
    ConnectionEnded { reason: Option<String> },
}

/// A reconciled layout for one tab.
///
/// Panes present before and after the change keep their local `PaneId`,
/// so existing terminal surfaces can be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutUpdate {
    pub tab_id: TabId,
    pub window_id: TmuxWindowId,
    pub tree: LayoutNode,
    /// Every pane in the tree with its local ID, in descriptor order
    pub panes: Vec<(TmuxPaneId, PaneId)>,
    /// Panes new to this tab
    pub added: Vec<TmuxPaneId>,
    /// Panes no longer in this tab; their mappings have been removed
    pub removed: Vec<TmuxPaneId>,
}

impl LayoutUpdate {
    /// Local ID for a tmux pane in this update
    pub fn local_pane(&self, tmux_pane_id: TmuxPaneId) -> Option<PaneId> {
        self.panes
            .iter()
            .find(|(id, _)| *id == tmux_pane_id)
            .map(|(_, pane_id)| *pane_id)
    }

    /// Whether the set of panes changed (as opposed to only sizes)
    pub fn is_structural(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}
