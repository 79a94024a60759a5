//! Identity mappings between tmux objects and local UI objects.
//!
//! tmux panes map to a (tab, local pane) pair and tmux windows map to tabs.
//! Both tables are bidirectional and owned by one `SessionManager`.

use crate::types::{PaneId, TabId, TmuxPaneId, TmuxWindowId};
use std::collections::HashMap;

/// Bidirectional tmux pane ↔ (tab, local pane) table.
#[derive(Debug, Default)]
pub struct PaneMapping {
    tmux_to_local: HashMap<TmuxPaneId, (TabId, PaneId)>,
    local_to_tmux: HashMap<PaneId, TmuxPaneId>,
}

impl PaneMapping {
    /// Create an empty mapping table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a tmux pane to a local pane.
    ///
    /// Re-registering either side replaces its previous binding in both
    /// directions, so the table never holds a stale reverse entry.
    pub fn register(&mut self, tmux_pane_id: TmuxPaneId, tab_id: TabId, pane_id: PaneId) {
        self.remove(tmux_pane_id);
        if let Some(previous) = self.local_to_tmux.remove(&pane_id) {
            self.tmux_to_local.remove(&previous);
        }
        self.tmux_to_local.insert(tmux_pane_id, (tab_id, pane_id));
        self.local_to_tmux.insert(pane_id, tmux_pane_id);
    }

    /// Remove a tmux pane's binding, returning what it was bound to.
    pub fn remove(&mut self, tmux_pane_id: TmuxPaneId) -> Option<(TabId, PaneId)> {
        let (tab_id, pane_id) = self.tmux_to_local.remove(&tmux_pane_id)?;
        self.local_to_tmux.remove(&pane_id);
        Some((tab_id, pane_id))
    }

    /// Remove every pane bound to `tab_id`, returning their tmux IDs.
    pub fn remove_tab(&mut self, tab_id: TabId) -> Vec<TmuxPaneId> {
        let mut removed: Vec<TmuxPaneId> = self
            .tmux_to_local
            .iter()
            .filter(|(_, (tab, _))| *tab == tab_id)
            .map(|(tmux_pane_id, _)| *tmux_pane_id)
            .collect();
        removed.sort_unstable();
        for tmux_pane_id in &removed {
            self.remove(*tmux_pane_id);
        }
        removed
    }

    /// Local binding of a tmux pane.
    pub fn local(&self, tmux_pane_id: TmuxPaneId) -> Option<(TabId, PaneId)> {
        self.tmux_to_local.get(&tmux_pane_id).copied()
    }

    /// tmux pane bound to a local pane.
    pub fn tmux_pane(&self, pane_id: PaneId) -> Option<TmuxPaneId> {
        self.local_to_tmux.get(&pane_id).copied()
    }

    /// tmux panes bound to `tab_id`, in ascending ID order.
    pub fn panes_in_tab(&self, tab_id: TabId) -> Vec<TmuxPaneId> {
        let mut panes: Vec<TmuxPaneId> = self
            .tmux_to_local
            .iter()
            .filter(|(_, (tab, _))| *tab == tab_id)
            .map(|(tmux_pane_id, _)| *tmux_pane_id)
            .collect();
        panes.sort_unstable();
        panes
    }

    pub fn len(&self) -> usize {
        self.tmux_to_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tmux_to_local.is_empty()
    }

    /// Drop every binding.
    pub fn clear(&mut self) {
        self.tmux_to_local.clear();
        self.local_to_tmux.clear();
    }
}

/// Bidirectional tmux window ↔ tab table.
#[derive(Debug, Default)]
pub struct WindowMapping {
    window_to_tab: HashMap<TmuxWindowId, TabId>,
    tab_to_window: HashMap<TabId, TmuxWindowId>,
}

impl WindowMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a tmux window to a tab.
    pub fn map_window(&mut self, window_id: TmuxWindowId, tab_id: TabId) {
        self.window_to_tab.insert(window_id, tab_id);
        self.tab_to_window.insert(tab_id, window_id);
    }

    /// Unmap a tmux window, returning its tab.
    pub fn unmap_window(&mut self, window_id: TmuxWindowId) -> Option<TabId> {
        let tab_id = self.window_to_tab.remove(&window_id)?;
        self.tab_to_window.remove(&tab_id);
        Some(tab_id)
    }

    pub fn tab(&self, window_id: TmuxWindowId) -> Option<TabId> {
        self.window_to_tab.get(&window_id).copied()
    }

    pub fn window(&self, tab_id: TabId) -> Option<TmuxWindowId> {
        self.tab_to_window.get(&tab_id).copied()
    }

    pub fn clear(&mut self) {
        self.window_to_tab.clear();
        self.tab_to_window.clear();
    }
}
