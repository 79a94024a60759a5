//! Control mode client
//!
//! Ties the pieces of one control connection together:
//!
//! ```text
//! transport bytes → LineBuffer → ProtocolParser → SessionManager → SessionEvent
//!                                                        ↑
//! UI operations → TmuxCommand → ControlChannel ──────────┘ (pending replies)
//! ```
//!
//! The client is driven by a single task. Either feed it lines yourself
//! (`feed_bytes`/`feed_line`) or hand it a reader with `run`.

use crate::channel::ControlChannel;
use crate::commands::TmuxCommand;
use crate::error::{Result, TmuxError};
use crate::keys::{encode_key, escape_keys_for_tmux};
use crate::layout::SplitAxis;
use crate::prefix::{PrefixKey, PrefixState, translate_command_key};
use crate::protocol::{LineBuffer, ProtocolParser};
use crate::session_manager::{CommandHandle, CommandKind, SessionEvent, SessionManager};
use crate::types::{PaneId, SessionState, TabId, TmuxPaneId, TmuxWindowId};
use par_term_config::TmuxConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;
use winit::keyboard::{Key, ModifiersState};

/// Quote a session name for the shell command that starts control mode
fn shell_quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "'\\''"))
}

/// Command that starts control mode in a new session
pub fn create_new_command(config: &TmuxConfig, session_name: Option<&str>) -> String {
    match session_name {
        Some(name) => format!("{} -CC new-session -s {}", config.tmux_path, shell_quote(name)),
        None => format!("{} -CC new-session", config.tmux_path),
    }
}

/// Command that attaches control mode to an existing session
pub fn attach_command(config: &TmuxConfig, session_name: &str) -> String {
    format!("{} -CC attach -t {}", config.tmux_path, shell_quote(session_name))
}

/// Command that attaches to a session, creating it if missing
pub fn create_or_attach_command(config: &TmuxConfig, session_name: &str) -> String {
    format!(
        "{} -CC new-session -A -s {}",
        config.tmux_path,
        shell_quote(session_name)
    )
}

/// The launch command the configuration asks for.
pub fn launch_command(config: &TmuxConfig) -> String {
    match config.effective_session_name() {
        Some(name) if config.auto_attach => create_or_attach_command(config, name),
        name => create_new_command(config, name),
    }
}

/// One tmux control connection.
pub struct ControlClient<C: ControlChannel> {
    channel: C,
    config: TmuxConfig,
    lines: LineBuffer,
    parser: ProtocolParser,
    manager: SessionManager,
    prefix_key: Option<PrefixKey>,
    prefix_state: PrefixState,
    bootstrapped: bool,
}

impl<C: ControlChannel> ControlClient<C> {
    /// Create a client writing commands to `channel`.
    ///
    /// An unparseable `prefix_key` disables prefix handling.
    pub fn new(channel: C, config: TmuxConfig) -> Self {
        let prefix_key = PrefixKey::parse(&config.prefix_key);
        if prefix_key.is_none() {
            log::warn!(
                "Invalid tmux prefix key '{}', prefix handling disabled",
                config.prefix_key
            );
        }
        Self {
            channel,
            config,
            lines: LineBuffer::new(),
            parser: ProtocolParser::new(),
            manager: SessionManager::new(),
            prefix_key,
            prefix_state: PrefixState::new(),
            bootstrapped: false,
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SessionManager {
        &mut self.manager
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn config(&self) -> &TmuxConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.manager.state()
    }

    /// Whether the prefix key was pressed and the next key is a command
    pub fn is_prefix_active(&self) -> bool {
        self.prefix_state.is_active()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Feed raw transport bytes; complete lines are processed immediately.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for line in self.lines.push(bytes) {
            events.extend(self.feed_line(&line));
        }
        events
    }

    /// Process one complete, CR-stripped line.
    pub fn feed_line(&mut self, line: &str) -> Vec<SessionEvent> {
        crate::debug_trace!("TMUX", "<< {}", line);
        let Some(notification) = self.parser.feed(line) else {
            self.maybe_bootstrap();
            return Vec::new();
        };
        let events = self.manager.handle_notification(notification);
        self.maybe_bootstrap();
        if self.bootstrapped
            && self.manager.state() == SessionState::Connected
            && events.contains(&SessionEvent::SessionsChanged)
            && let Err(err) = self.list_sessions()
        {
            log::error!("Failed to refresh tmux session list: {}", err);
        }
        events
    }

    /// Drive the connection from `reader` until `%exit` or end of input.
    ///
    /// Events are forwarded to `events` as they are produced. End of input
    /// without `%exit` tears the connection down as `shutdown` does.
    pub async fn run<R>(
        &mut self,
        mut reader: R,
        events: UnboundedSender<SessionEvent>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            let chunk = match reader.fill_buf().await {
                Ok(chunk) => chunk,
                Err(err) => {
                    log::error!("tmux control connection read failed: {}", err);
                    forward(&events, self.manager.shutdown());
                    return Err(TmuxError::Channel(err.to_string()));
                }
            };
            if chunk.is_empty() {
                crate::debug_info!("TMUX", "Control connection reached end of input");
                forward(&events, self.manager.shutdown());
                return Ok(());
            }

            let consumed = chunk.len();
            let produced = self.feed_bytes(chunk);
            reader.consume(consumed);

            if !forward(&events, produced) {
                crate::debug_info!("TMUX", "Event receiver dropped, stopping reader");
                return Ok(());
            }
            if self.manager.state() == SessionState::Ended {
                return Ok(());
            }
        }
    }

    /// Bootstrap once connected, but not while a reply block is open: the
    /// launch command's own reply must not be mistaken for ours.
    fn maybe_bootstrap(&mut self) {
        if self.bootstrapped
            || self.manager.state() != SessionState::Connected
            || self.parser.is_in_block()
        {
            return;
        }
        self.bootstrapped = true;
        if let Err(err) = self.bootstrap() {
            log::error!("Failed to send tmux bootstrap commands: {}", err);
        }
        self.flush_deferred();
    }

    /// Send commands submitted before the connection was attached, behind
    /// the bootstrap queries so replies keep matching in send order.
    fn flush_deferred(&mut self) {
        for (submission, command) in self.manager.release_deferred() {
            crate::debug_trace!("TMUX", ">> {} (deferred)", command);
            if let Err(err) = self.channel.send_line(command.as_str()) {
                log::error!("Failed to send deferred tmux command '{}': {}", command, err);
                self.manager.cancel(submission, err);
            }
        }
    }

    fn bootstrap(&mut self) -> Result<()> {
        crate::debug_info!("TMUX", "Connected, sending bootstrap commands");
        if self.config.window_size_smallest {
            self.submit(TmuxCommand::window_size_smallest())?;
        }
        if let Some((cols, rows)) = self.config.initial_client_size {
            self.submit(TmuxCommand::set_client_size(cols, rows))?;
        }
        self.list_windows()?;
        self.list_sessions()?;
        Ok(())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a command, returning its completion handle.
    ///
    /// Before the connection is attached the command is held back and sent
    /// after the bootstrap queries. tmux answers its launch command with a
    /// reply block of its own, which must not be matched to ours.
    pub fn submit(&mut self, command: TmuxCommand) -> Result<CommandHandle> {
        self.submit_with_kind(command, CommandKind::Generic)
    }

    fn submit_with_kind(
        &mut self,
        command: TmuxCommand,
        kind: CommandKind,
    ) -> Result<CommandHandle> {
        if !self.bootstrapped {
            return self.manager.defer(&command, kind);
        }
        let handle = self.manager.submit(&command, kind)?;
        crate::debug_trace!("TMUX", ">> {}", command);
        if let Err(err) = self.channel.send_line(command.as_str()) {
            self.manager.cancel(handle.submission(), err.clone());
            return Err(err);
        }
        Ok(handle)
    }

    /// Refresh the window snapshot (`SessionEvent::WindowsListed` follows)
    pub fn list_windows(&mut self) -> Result<CommandHandle> {
        self.submit_with_kind(TmuxCommand::list_windows(), CommandKind::ListWindows)
    }

    /// Refresh the session snapshot (`SessionEvent::SessionsListed` follows)
    pub fn list_sessions(&mut self) -> Result<CommandHandle> {
        self.submit_with_kind(TmuxCommand::list_sessions(), CommandKind::ListSessions)
    }

    fn tmux_pane(&self, pane_id: PaneId) -> Result<TmuxPaneId> {
        self.manager
            .tmux_pane_id(pane_id)
            .ok_or(TmuxError::UnknownPane(pane_id))
    }

    fn tmux_window(&self, tab_id: TabId) -> Result<TmuxWindowId> {
        self.manager
            .window_for_tab(tab_id)
            .ok_or(TmuxError::UnknownTab(tab_id))
    }

    /// Split a local pane. The new pane arrives with the next layout change.
    pub fn split_pane(&mut self, pane_id: PaneId, axis: SplitAxis) -> Result<CommandHandle> {
        let tmux_pane = self.tmux_pane(pane_id)?;
        self.submit(TmuxCommand::split_pane(axis, tmux_pane))
    }

    /// Close a local pane.
    pub fn close_pane(&mut self, pane_id: PaneId) -> Result<CommandHandle> {
        let tmux_pane = self.tmux_pane(pane_id)?;
        self.submit(TmuxCommand::kill_pane(tmux_pane))
    }

    pub fn select_pane(&mut self, pane_id: PaneId) -> Result<CommandHandle> {
        let tmux_pane = self.tmux_pane(pane_id)?;
        self.submit(TmuxCommand::select_pane(tmux_pane))
    }

    /// Toggle zoom on a local pane
    pub fn zoom_pane(&mut self, pane_id: PaneId) -> Result<CommandHandle> {
        let tmux_pane = self.tmux_pane(pane_id)?;
        self.submit(TmuxCommand::zoom_pane(tmux_pane))
    }

    /// Open a new tmux window; its tab arrives with `%window-add`.
    pub fn new_tab(&mut self, name: Option<&str>) -> Result<CommandHandle> {
        self.submit(TmuxCommand::new_window(name))
    }

    pub fn close_tab(&mut self, tab_id: TabId) -> Result<CommandHandle> {
        let window = self.tmux_window(tab_id)?;
        self.submit(TmuxCommand::kill_window(window))
    }

    pub fn rename_tab(&mut self, tab_id: TabId, name: &str) -> Result<CommandHandle> {
        let window = self.tmux_window(tab_id)?;
        self.submit(TmuxCommand::rename_window(window, name))
    }

    pub fn select_tab(&mut self, tab_id: TabId) -> Result<CommandHandle> {
        let window = self.tmux_window(tab_id)?;
        self.submit(TmuxCommand::select_window(window))
    }

    pub fn switch_session(&mut self, name: &str) -> Result<CommandHandle> {
        self.submit(TmuxCommand::switch_session(name))
    }

    /// Tell tmux this client's size in cells.
    pub fn resize(&mut self, cols: usize, rows: usize) -> Result<CommandHandle> {
        self.submit(TmuxCommand::set_client_size(cols, rows))
    }

    /// Ask tmux to resume output for a paused pane.
    pub fn resume_pane(&mut self, tmux_pane_id: TmuxPaneId) -> Result<CommandHandle> {
        self.submit(TmuxCommand::continue_pane(tmux_pane_id))
    }

    pub fn detach(&mut self) -> Result<CommandHandle> {
        self.submit(TmuxCommand::detach())
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    /// Forward a key press to a pane.
    ///
    /// The configured prefix key is intercepted: it arms prefix mode and the
    /// next key is translated to a tmux command instead of being typed.
    /// Returns `Ok(None)` when nothing was sent.
    pub fn send_key(
        &mut self,
        pane_id: PaneId,
        key: &Key,
        modifiers: ModifiersState,
    ) -> Result<Option<CommandHandle>> {
        if self.prefix_state.is_active() {
            self.prefix_state.exit();
            let focused = self.manager.tmux_pane_id(pane_id);
            return match translate_command_key(key, focused) {
                Some(command) => self.submit(command).map(Some),
                None => {
                    crate::debug_log!("TMUX", "No prefix binding for {:?}", key);
                    Ok(None)
                }
            };
        }

        if let Some(prefix) = &self.prefix_key
            && prefix.matches(key, modifiers)
        {
            self.prefix_state.enter();
            return Ok(None);
        }

        let tmux_pane = self.tmux_pane(pane_id)?;
        if let Some(encoded) = encode_key(key, modifiers) {
            return self.submit(TmuxCommand::send_keys(tmux_pane, &encoded)).map(Some);
        }
        match key {
            Key::Character(text) => self
                .submit(TmuxCommand::send_literal(tmux_pane, text))
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Forward raw input bytes (e.g. a paste or an escape sequence) to a pane.
    pub fn send_bytes(&mut self, pane_id: PaneId, data: &[u8]) -> Result<Option<CommandHandle>> {
        let tmux_pane = self.tmux_pane(pane_id)?;
        let keys = escape_keys_for_tmux(data);
        if keys.is_empty() {
            return Ok(None);
        }
        self.submit(TmuxCommand::send_keys(tmux_pane, &keys)).map(Some)
    }

    /// Type literal text into a pane.
    pub fn send_literal(&mut self, pane_id: PaneId, text: &str) -> Result<CommandHandle> {
        let tmux_pane = self.tmux_pane(pane_id)?;
        self.submit(TmuxCommand::send_literal(tmux_pane, text))
    }

    /// End the connection locally; outstanding commands fail.
    pub fn shutdown(&mut self) -> Vec<SessionEvent> {
        self.parser.reset();
        self.lines.clear();
        self.manager.shutdown()
    }
}

/// Forward events, returning `false` once the receiver is gone.
fn forward(sender: &UnboundedSender<SessionEvent>, events: Vec<SessionEvent>) -> bool {
    events.into_iter().all(|event| sender.send(event).is_ok())
}
