//! tmux command builders for control mode
//!
//! Pure builders for the command lines written back on the control channel.
//! A `TmuxCommand` holds the text without its trailing newline; use
//! `as_bytes` (or `ControlChannel::send_line`) to frame it for sending.

use crate::layout::SplitAxis;
use crate::types::{TmuxPaneId, TmuxWindowId};

/// `list-windows` format: window ID, active pane ID, then the free-text name.
/// Tabs separate the fields; the name is last so it may contain tabs itself.
pub const LIST_WINDOWS_FORMAT: &str = "#{window_id}\t#{pane_id}\t#{window_name}";

/// `list-panes` format: window ID, pane ID, then the pane size.
pub const LIST_PANES_FORMAT: &str = "#{window_id}\t#{pane_id}\t#{pane_width}x#{pane_height}";

/// Build a `split-window` command for a tmux pane.
///
/// Horizontal places the new pane beside the target (`-h`), vertical below it (`-v`).
pub fn tmux_split_command(axis: SplitAxis, pane_id: TmuxPaneId) -> String {
    let flag = match axis {
        SplitAxis::Horizontal => "-h",
        SplitAxis::Vertical => "-v",
    };
    format!("split-window {} -t %{}", flag, pane_id)
}

/// Build a `kill-pane` command for a tmux pane.
pub fn tmux_kill_pane_command(pane_id: TmuxPaneId) -> String {
    format!("kill-pane -t %{}", pane_id)
}

/// Quote user-supplied text for a tmux command line
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// A tmux command ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxCommand {
    /// The command string (without trailing newline)
    command: String,
}

impl TmuxCommand {
    /// Create a command from a raw string
    pub fn raw(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The command string without trailing newline
    pub fn as_str(&self) -> &str {
        &self.command
    }

    /// The command as newline-terminated bytes for the control channel
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = self.command.as_bytes().to_vec();
        bytes.push(b'\n');
        bytes
    }

    // =========================================================================
    // Session Commands
    // =========================================================================

    /// List all sessions in tmux's default format
    /// (`name: N windows (created ...) (attached)`)
    pub fn list_sessions() -> Self {
        Self::raw("list-sessions")
    }

    /// Switch this client to another session
    pub fn switch_session(session: &str) -> Self {
        Self::raw(format!("switch-client -t {}", quote(session)))
    }

    /// Create a detached session
    pub fn new_session(name: Option<&str>) -> Self {
        match name {
            Some(n) => Self::raw(format!("new-session -d -s {}", quote(n))),
            None => Self::raw("new-session -d"),
        }
    }

    /// Rename the attached session
    pub fn rename_session(name: &str) -> Self {
        Self::raw(format!("rename-session {}", quote(name)))
    }

    /// Kill a session
    pub fn kill_session(session: &str) -> Self {
        Self::raw(format!("kill-session -t {}", quote(session)))
    }

    /// Detach this control client
    pub fn detach() -> Self {
        Self::raw("detach-client")
    }

    // =========================================================================
    // Window Commands
    // =========================================================================

    /// List windows of the attached session, one `@id\t%pane\tname` per line
    pub fn list_windows() -> Self {
        Self::raw(format!("list-windows -F '{}'", LIST_WINDOWS_FORMAT))
    }

    /// Create a new window
    pub fn new_window(name: Option<&str>) -> Self {
        match name {
            Some(n) => Self::raw(format!("new-window -n {}", quote(n))),
            None => Self::raw("new-window"),
        }
    }

    /// Select a window by ID
    pub fn select_window(window_id: TmuxWindowId) -> Self {
        Self::raw(format!("select-window -t @{}", window_id))
    }

    /// Kill a window
    pub fn kill_window(window_id: TmuxWindowId) -> Self {
        Self::raw(format!("kill-window -t @{}", window_id))
    }

    /// Rename a window
    pub fn rename_window(window_id: TmuxWindowId, name: &str) -> Self {
        Self::raw(format!("rename-window -t @{} {}", window_id, quote(name)))
    }

    // =========================================================================
    // Pane Commands
    // =========================================================================

    /// List panes of a window as `@window<TAB>%pane<TAB>WxH` lines.
    ///
    /// Reply lines must not start with `%` or the parser takes them for
    /// notifications, so the window ID leads.
    pub fn list_panes(window_id: TmuxWindowId) -> Self {
        Self::raw(format!("list-panes -t @{} -F '{}'", window_id, LIST_PANES_FORMAT))
    }

    /// Split a pane along `axis`
    pub fn split_pane(axis: SplitAxis, pane_id: TmuxPaneId) -> Self {
        Self::raw(tmux_split_command(axis, pane_id))
    }

    /// Select a pane by ID
    pub fn select_pane(pane_id: TmuxPaneId) -> Self {
        Self::raw(format!("select-pane -t %{}", pane_id))
    }

    /// Kill a pane
    pub fn kill_pane(pane_id: TmuxPaneId) -> Self {
        Self::raw(tmux_kill_pane_command(pane_id))
    }

    /// Resize a pane
    pub fn resize_pane(pane_id: TmuxPaneId, width: Option<usize>, height: Option<usize>) -> Self {
        let mut cmd = format!("resize-pane -t %{}", pane_id);
        if let Some(w) = width {
            cmd.push_str(&format!(" -x {}", w));
        }
        if let Some(h) = height {
            cmd.push_str(&format!(" -y {}", h));
        }
        Self::raw(cmd)
    }

    /// Toggle zoom on a pane
    pub fn zoom_pane(pane_id: TmuxPaneId) -> Self {
        Self::raw(format!("resize-pane -Z -t %{}", pane_id))
    }

    // =========================================================================
    // Input/Output Commands
    // =========================================================================

    /// Send tmux key names (already escaped, e.g. `S-Up` or `'abc' Enter`)
    pub fn send_keys(pane_id: TmuxPaneId, keys: &str) -> Self {
        Self::raw(format!("send-keys -t %{} {}", pane_id, keys))
    }

    /// Send literal text to a pane
    pub fn send_literal(pane_id: TmuxPaneId, text: &str) -> Self {
        Self::raw(format!("send-keys -t %{} -l {}", pane_id, quote(text)))
    }

    /// Capture pane contents (comes back as a command response)
    pub fn capture_pane(
        pane_id: TmuxPaneId,
        start_line: Option<i32>,
        end_line: Option<i32>,
    ) -> Self {
        let mut cmd = format!("capture-pane -t %{} -p -e", pane_id);
        if let Some(start) = start_line {
            cmd.push_str(&format!(" -S {}", start));
        }
        if let Some(end) = end_line {
            cmd.push_str(&format!(" -E {}", end));
        }
        Self::raw(cmd)
    }

    // =========================================================================
    // Clipboard Commands
    // =========================================================================

    /// Set the tmux paste buffer
    pub fn set_buffer(content: &str) -> Self {
        Self::raw(format!("set-buffer {}", quote(content)))
    }

    /// Get the tmux paste buffer
    pub fn get_buffer() -> Self {
        Self::raw("show-buffer")
    }

    // =========================================================================
    // Control Mode Specific
    // =========================================================================

    /// Refresh client (request full state update)
    pub fn refresh_client() -> Self {
        Self::raw("refresh-client")
    }

    /// Set the control client size.
    ///
    /// tmux does not know a control client's size unless told; pane sizes
    /// depend on it.
    pub fn set_client_size(cols: usize, rows: usize) -> Self {
        Self::raw(format!("refresh-client -C {}x{}", cols, rows))
    }

    /// Resume output for a pane paused by flow control
    pub fn continue_pane(pane_id: TmuxPaneId) -> Self {
        Self::raw(format!("refresh-client -A '%{}:continue'", pane_id))
    }

    /// Size windows to the smallest attached client
    pub fn window_size_smallest() -> Self {
        Self::raw("set-option -g window-size smallest")
    }
}

impl std::fmt::Display for TmuxCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command)
    }
}
