//! Per-connection tmux state.
//!
//! A `SessionManager` is created for one control connection and owns
//! everything learned over it: window and session snapshots, the tabs that
//! back tmux windows, pane identity mappings and outstanding commands. It
//! performs no I/O. Notifications go in through `handle_notification` and
//! come back out as `SessionEvent`s for the UI layer; commands are
//! registered with `submit` and written to the channel by the caller.
//!
//! State is mutated only by the task driving the connection, so nothing in
//! here is locked.

mod events;
mod mapping;
mod pending;

pub use events::{LayoutUpdate, SessionEvent};
pub use mapping::{PaneMapping, WindowMapping};
pub use pending::{CommandHandle, CommandKind, CommandReply, PendingCommands};

use crate::commands::TmuxCommand;
use crate::error::{Result, TmuxError};
use crate::layout::LayoutNode;
use crate::listing::{parse_session_list, parse_window_list};
use crate::protocol::Notification;
use crate::types::{
    PaneId, SessionInfo, SessionState, TabId, TmuxPaneId, TmuxSessionId, TmuxWindowId, WindowInfo,
};
use std::collections::HashSet;

/// A tab backing one tmux window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxTab {
    pub tab_id: TabId,
    pub window_id: TmuxWindowId,
    pub title: String,
    /// Active pane as last reported by tmux
    pub active_pane: Option<TmuxPaneId>,
    /// Last successfully parsed layout
    pub layout: Option<LayoutNode>,
}

/// State for one tmux control connection
#[derive(Debug)]
pub struct SessionManager {
    state: SessionState,
    /// Attached session, once `%session-changed` has been seen
    session: Option<(TmuxSessionId, String)>,
    windows: Vec<WindowInfo>,
    sessions: Vec<SessionInfo>,
    tabs: Vec<TmuxTab>,
    window_mapping: WindowMapping,
    pane_mapping: PaneMapping,
    pending: PendingCommands,
    paused_panes: HashSet<TmuxPaneId>,
    next_tab_id: TabId,
    next_pane_id: PaneId,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Create the manager for a new connection, in the `Connecting` state.
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            session: None,
            windows: Vec::new(),
            sessions: Vec::new(),
            tabs: Vec::new(),
            window_mapping: WindowMapping::new(),
            pane_mapping: PaneMapping::new(),
            pending: PendingCommands::new(),
            paused_panes: HashSet::new(),
            next_tab_id: 1,
            next_pane_id: 1,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Attached session ID and name
    pub fn session(&self) -> Option<(TmuxSessionId, &str)> {
        self.session.as_ref().map(|(id, name)| (*id, name.as_str()))
    }

    /// Windows of the attached session, in tmux order
    pub fn windows(&self) -> &[WindowInfo] {
        &self.windows
    }

    /// Last `list-sessions` snapshot
    pub fn sessions(&self) -> &[SessionInfo] {
        &self.sessions
    }

    /// Tracked tabs, in creation order
    pub fn tabs(&self) -> &[TmuxTab] {
        &self.tabs
    }

    pub fn tab_for_window(&self, window_id: TmuxWindowId) -> Option<&TmuxTab> {
        let tab_id = self.window_mapping.tab(window_id)?;
        self.tabs.iter().find(|tab| tab.tab_id == tab_id)
    }

    pub fn window_for_tab(&self, tab_id: TabId) -> Option<TmuxWindowId> {
        self.window_mapping.window(tab_id)
    }

    /// Number of commands awaiting a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pane_paused(&self, tmux_pane_id: TmuxPaneId) -> bool {
        self.paused_panes.contains(&tmux_pane_id)
    }

    // =========================================================================
    // Tabs and pane mappings
    // =========================================================================

    /// Start tracking a tab for `window_id`.
    ///
    /// Idempotent per window: if the window already has a tab nothing
    /// changes, whatever `pane_id` and `title` say. Returns the new tab's ID
    /// only when one was created.
    pub fn add_tmux_tab(
        &mut self,
        window_id: TmuxWindowId,
        pane_id: Option<TmuxPaneId>,
        title: &str,
    ) -> Option<TabId> {
        if self.window_mapping.tab(window_id).is_some() {
            crate::debug_trace!("TMUX", "Window @{} already has a tab", window_id);
            return None;
        }

        let tab_id = self.next_tab_id;
        self.next_tab_id += 1;
        self.window_mapping.map_window(window_id, tab_id);
        self.tabs.push(TmuxTab {
            tab_id,
            window_id,
            title: title.to_string(),
            active_pane: pane_id,
            layout: None,
        });

        if let Some(pane_id) = pane_id {
            let local = self.allocate_pane_id();
            self.pane_mapping.register(pane_id, tab_id, local);
        }

        crate::debug_info!(
            "TMUX",
            "Tracking window @{} as tab {} ({:?})",
            window_id,
            tab_id,
            title
        );
        Some(tab_id)
    }

    /// Bind a tmux pane to a local pane in `tab_id`.
    pub fn register_tmux_pane_mapping(
        &mut self,
        tmux_pane_id: TmuxPaneId,
        tab_id: TabId,
        pane_id: PaneId,
    ) {
        // Keep allocated IDs ahead of anything registered explicitly
        if pane_id >= self.next_pane_id {
            self.next_pane_id = pane_id + 1;
        }
        self.pane_mapping.register(tmux_pane_id, tab_id, pane_id);
    }

    /// Remove a tmux pane's binding.
    pub fn remove_tmux_pane_mapping(
        &mut self,
        tmux_pane_id: TmuxPaneId,
    ) -> Option<(TabId, PaneId)> {
        self.pane_mapping.remove(tmux_pane_id)
    }

    /// tmux pane bound to a local pane
    pub fn tmux_pane_id(&self, pane_id: PaneId) -> Option<TmuxPaneId> {
        self.pane_mapping.tmux_pane(pane_id)
    }

    /// Local (tab, pane) bound to a tmux pane
    pub fn local_pane(&self, tmux_pane_id: TmuxPaneId) -> Option<(TabId, PaneId)> {
        self.pane_mapping.local(tmux_pane_id)
    }

    fn allocate_pane_id(&mut self) -> PaneId {
        let id = self.next_pane_id;
        self.next_pane_id += 1;
        id
    }

    fn tab_mut(&mut self, tab_id: TabId) -> Option<&mut TmuxTab> {
        self.tabs.iter_mut().find(|tab| tab.tab_id == tab_id)
    }

    fn window_mut(&mut self, window_id: TmuxWindowId) -> Option<&mut WindowInfo> {
        self.windows.iter_mut().find(|w| w.window_id == window_id)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Register a command about to be written to the channel.
    ///
    /// Fails once the connection has ended.
    pub fn submit(&mut self, command: &TmuxCommand, kind: CommandKind) -> Result<CommandHandle> {
        if self.state == SessionState::Ended {
            return Err(TmuxError::ConnectionClosed { reason: None });
        }
        crate::debug_trace!("TMUX", "Submitting: {}", command);
        Ok(self.pending.register(command, kind))
    }

    /// Register a command that must not be written yet.
    ///
    /// Replies are not matched to it until `release_deferred` hands it back
    /// for sending. Fails once the connection has ended.
    pub fn defer(&mut self, command: &TmuxCommand, kind: CommandKind) -> Result<CommandHandle> {
        if self.state == SessionState::Ended {
            return Err(TmuxError::ConnectionClosed { reason: None });
        }
        Ok(self.pending.defer(command, kind))
    }

    /// Queue deferred commands behind those already written and return
    /// them, with their submission numbers, in send order.
    pub fn release_deferred(&mut self) -> Vec<(u64, TmuxCommand)> {
        self.pending.release_deferred()
    }

    /// Number of submitted commands still waiting to be written
    pub fn deferred_count(&self) -> usize {
        self.pending.deferred_len()
    }

    /// Withdraw a submitted command that could not be written.
    pub fn cancel(&mut self, submission: u64, error: TmuxError) {
        self.pending.cancel(submission, error);
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Apply one notification, returning the events it produced.
    pub fn handle_notification(&mut self, notification: Notification) -> Vec<SessionEvent> {
        if self.state == SessionState::Ended {
            crate::debug_log!(
                "TMUX",
                "Ignoring %{} after connection ended",
                notification.notification_type()
            );
            return Vec::new();
        }

        let mut events = Vec::new();
        match notification {
            Notification::Output { pane_id, data }
            | Notification::ExtendedOutput { pane_id, data, .. } => {
                self.route_output(pane_id, data, &mut events);
            }
            Notification::WindowAdd(window_id) => {
                self.handle_window_add(window_id, &mut events);
            }
            Notification::WindowClose(window_id) => {
                self.handle_window_close(window_id, &mut events);
            }
            Notification::WindowRenamed { window_id, name } => {
                self.handle_window_renamed(window_id, name, &mut events);
            }
            Notification::LayoutChange {
                window_id, layout, ..
            } => {
                self.handle_layout_change(window_id, &layout, &mut events);
            }
            Notification::WindowPaneChanged { window_id, pane_id } => {
                self.handle_window_pane_changed(window_id, pane_id, &mut events);
            }
            Notification::SessionChanged { session_id, name } => {
                if self.state == SessionState::Connecting {
                    log::info!("tmux control mode connected to session '{}'", name);
                    self.state = SessionState::Connected;
                }
                self.session = Some((session_id, name.clone()));
                events.push(SessionEvent::SessionChanged { session_id, name });
            }
            Notification::SessionRenamed { session_id, name } => {
                if let Some((current, current_name)) = &mut self.session
                    && *current == session_id
                {
                    *current_name = name.clone();
                    events.push(SessionEvent::SessionChanged { session_id, name });
                }
            }
            Notification::SessionWindowChanged {
                session_id,
                window_id,
            } => {
                crate::debug_trace!(
                    "TMUX",
                    "Session ${} current window is now @{}",
                    session_id,
                    window_id
                );
            }
            Notification::SessionsChanged => events.push(SessionEvent::SessionsChanged),
            Notification::PaneModeChanged(tmux_pane_id) => {
                events.push(SessionEvent::PaneModeChanged {
                    tmux_pane_id,
                    pane_id: self.local_pane(tmux_pane_id).map(|(_, pane)| pane),
                });
            }
            Notification::Pause(tmux_pane_id) => {
                log::info!("tmux paused output for pane %{}", tmux_pane_id);
                self.paused_panes.insert(tmux_pane_id);
                events.push(SessionEvent::PanePaused { tmux_pane_id });
            }
            Notification::Continue(tmux_pane_id) => {
                if self.paused_panes.remove(&tmux_pane_id) {
                    log::info!("tmux resumed output for pane %{}", tmux_pane_id);
                }
                events.push(SessionEvent::PaneResumed { tmux_pane_id });
            }
            Notification::ClientDetached(client) => {
                crate::debug_info!("TMUX", "Client {} detached", client);
            }
            Notification::BlockEnd {
                command_number,
                data,
            } => {
                self.complete_command(command_number, Ok(data), &mut events);
            }
            Notification::BlockError {
                command_number,
                data,
            } => {
                self.complete_command(command_number, Err(data), &mut events);
            }
            Notification::Exit(reason) => {
                events.extend(self.end_connection(reason));
            }
            Notification::Unrecognized(line) => {
                crate::debug_log!("TMUX", "Ignoring unrecognized line: {}", line);
            }
        }
        events
    }

    /// Tear the connection down from this side.
    ///
    /// Outstanding commands fail with `ConnectionClosed` and all state is
    /// cleared, exactly as for `%exit`. A second call does nothing.
    pub fn shutdown(&mut self) -> Vec<SessionEvent> {
        if self.state == SessionState::Ended {
            return Vec::new();
        }
        self.end_connection(None)
    }

    fn end_connection(&mut self, reason: Option<String>) -> Vec<SessionEvent> {
        log::info!(
            "tmux control connection ended{}",
            reason
                .as_deref()
                .map(|r| format!(": {}", r))
                .unwrap_or_default()
        );
        self.pending.fail_all(TmuxError::ConnectionClosed {
            reason: reason.clone(),
        });
        self.pane_mapping.clear();
        self.window_mapping.clear();
        self.tabs.clear();
        self.windows.clear();
        self.sessions.clear();
        self.paused_panes.clear();
        self.session = None;
        self.state = SessionState::Ended;
        vec![SessionEvent::ConnectionEnded { reason }]
    }

    fn complete_command(
        &mut self,
        command_number: u32,
        outcome: std::result::Result<String, String>,
        events: &mut Vec<SessionEvent>,
    ) {
        let output = outcome.as_ref().ok().cloned();
        let Some(kind) = self.pending.complete(command_number, outcome) else {
            crate::debug_log!(
                "TMUX",
                "Ignoring reply block {} with no pending command",
                command_number
            );
            return;
        };

        match (kind, output) {
            (CommandKind::ListWindows, Some(output)) => {
                self.apply_window_list(parse_window_list(&output), events);
            }
            (CommandKind::ListSessions, Some(output)) => {
                self.sessions = parse_session_list(&output);
                events.push(SessionEvent::SessionsListed(self.sessions.clone()));
            }
            _ => {}
        }
    }

    /// Replace the window snapshot and make sure every window has a tab.
    fn apply_window_list(&mut self, windows: Vec<WindowInfo>, events: &mut Vec<SessionEvent>) {
        for window in &windows {
            if let Some(tab_id) = self.add_tmux_tab(window.window_id, window.pane_id, &window.name)
            {
                events.push(SessionEvent::TabCreated {
                    tab_id,
                    window_id: window.window_id,
                    title: window.name.clone(),
                });
            }
        }
        self.windows = windows;
        events.push(SessionEvent::WindowsListed(self.windows.clone()));
    }

    fn route_output(
        &mut self,
        tmux_pane_id: TmuxPaneId,
        data: Vec<u8>,
        events: &mut Vec<SessionEvent>,
    ) {
        match self.pane_mapping.local(tmux_pane_id) {
            Some((tab_id, pane_id)) => events.push(SessionEvent::PaneOutput {
                tab_id,
                pane_id,
                tmux_pane_id,
                data,
            }),
            None => {
                crate::debug_trace!(
                    "TMUX",
                    "Dropping {} bytes for unmapped pane %{}",
                    data.len(),
                    tmux_pane_id
                );
            }
        }
    }

    fn handle_window_add(&mut self, window_id: TmuxWindowId, events: &mut Vec<SessionEvent>) {
        if self.window_mut(window_id).is_none() {
            self.windows.push(WindowInfo::new(window_id, None, ""));
        }
        if let Some(tab_id) = self.add_tmux_tab(window_id, None, "") {
            events.push(SessionEvent::TabCreated {
                tab_id,
                window_id,
                title: String::new(),
            });
        }
    }

    fn handle_window_close(&mut self, window_id: TmuxWindowId, events: &mut Vec<SessionEvent>) {
        self.windows.retain(|w| w.window_id != window_id);
        let Some(tab_id) = self.window_mapping.unmap_window(window_id) else {
            crate::debug_log!("TMUX", "Close for untracked window @{}", window_id);
            return;
        };
        self.tabs.retain(|tab| tab.tab_id != tab_id);
        for tmux_pane_id in self.pane_mapping.remove_tab(tab_id) {
            self.paused_panes.remove(&tmux_pane_id);
        }
        events.push(SessionEvent::TabClosed { tab_id, window_id });
    }

    fn handle_window_renamed(
        &mut self,
        window_id: TmuxWindowId,
        name: String,
        events: &mut Vec<SessionEvent>,
    ) {
        if let Some(window) = self.window_mut(window_id) {
            window.name = name.clone();
        }
        let Some(tab_id) = self.window_mapping.tab(window_id) else {
            return;
        };
        if let Some(tab) = self.tab_mut(tab_id) {
            tab.title = name.clone();
        }
        events.push(SessionEvent::TabRenamed { tab_id, name });
    }

    fn handle_window_pane_changed(
        &mut self,
        window_id: TmuxWindowId,
        tmux_pane_id: TmuxPaneId,
        events: &mut Vec<SessionEvent>,
    ) {
        if let Some(window) = self.window_mut(window_id) {
            window.pane_id = Some(tmux_pane_id);
        }
        let tab_id = self.window_mapping.tab(window_id);
        if let Some(tab_id) = tab_id
            && let Some(tab) = self.tab_mut(tab_id)
        {
            tab.active_pane = Some(tmux_pane_id);
        }
        events.push(SessionEvent::ActivePaneChanged {
            tab_id,
            window_id,
            tmux_pane_id,
            pane_id: self.local_pane(tmux_pane_id).map(|(_, pane)| pane),
        });
    }

    /// Reconcile a new layout with the panes already mapped to the tab.
    ///
    /// Panes in both the old and new sets keep their local IDs. An
    /// unparseable descriptor leaves the previous tree in place.
    fn handle_layout_change(
        &mut self,
        window_id: TmuxWindowId,
        descriptor: &str,
        events: &mut Vec<SessionEvent>,
    ) {
        let Some(tree) = LayoutNode::parse(descriptor) else {
            crate::debug_error!(
                "TMUX",
                "Failed to parse layout for window @{}: {}",
                window_id,
                descriptor
            );
            return;
        };

        let tab_id = match self.window_mapping.tab(window_id) {
            Some(tab_id) => tab_id,
            None => {
                // Layout for a window we were never told about, e.g. one that
                // existed before attaching
                let title = self
                    .windows
                    .iter()
                    .find(|w| w.window_id == window_id)
                    .map(|w| w.name.clone())
                    .unwrap_or_default();
                let Some(tab_id) = self.add_tmux_tab(window_id, None, &title) else {
                    return;
                };
                events.push(SessionEvent::TabCreated {
                    tab_id,
                    window_id,
                    title,
                });
                tab_id
            }
        };

        let new_panes = tree.all_pane_ids();
        let removed: Vec<TmuxPaneId> = self
            .pane_mapping
            .panes_in_tab(tab_id)
            .into_iter()
            .filter(|id| !new_panes.contains(id))
            .collect();
        for tmux_pane_id in &removed {
            self.pane_mapping.remove(*tmux_pane_id);
            self.paused_panes.remove(tmux_pane_id);
        }

        let mut added = Vec::new();
        let mut panes = Vec::with_capacity(new_panes.len());
        for tmux_pane_id in new_panes {
            let pane_id = match self.pane_mapping.local(tmux_pane_id) {
                Some((owner, pane_id)) if owner == tab_id => pane_id,
                _ => {
                    let pane_id = self.allocate_pane_id();
                    self.pane_mapping.register(tmux_pane_id, tab_id, pane_id);
                    added.push(tmux_pane_id);
                    pane_id
                }
            };
            panes.push((tmux_pane_id, pane_id));
        }

        crate::debug_info!(
            "TMUX",
            "Layout for window @{} (tab {}): {} panes, added {:?}, removed {:?}",
            window_id,
            tab_id,
            panes.len(),
            added,
            removed
        );

        if let Some(tab) = self.tab_mut(tab_id) {
            tab.layout = Some(tree.clone());
        }
        events.push(SessionEvent::LayoutChanged(LayoutUpdate {
            tab_id,
            window_id,
            tree,
            panes,
            added,
            removed,
        }));
    }
}
