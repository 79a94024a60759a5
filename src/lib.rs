// Library exports for the tmux control mode engine
//
// Layering, bottom up:
//
//   - `protocol`, `layout`, `listing`, `keys`, `commands` are pure: text in,
//     values out, no state beyond a parser's open block.
//   - `session_manager` owns the per-connection state and turns
//     notifications into `SessionEvent`s. It does no I/O.
//   - `client` connects a `ControlChannel` and a line source to a
//     `SessionManager` and exposes the imperative UI operations.
//
// All state is single-writer: one task feeds lines and issues commands.

/// Crate version, for callers that report it alongside the tmux version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod channel;
pub mod client;
pub mod commands;
pub mod error;
pub mod keys;
pub mod layout;
pub mod listing;
pub mod prefix;
pub mod protocol;
pub mod session_manager;
pub mod types;

pub use channel::ControlChannel;
pub use client::{ControlClient, launch_command};
pub use commands::{TmuxCommand, tmux_kill_pane_command, tmux_split_command};
pub use error::{Result, TmuxError};
pub use keys::{encode_key, escape_keys_for_tmux, special_key, with_modifier_prefix};
pub use layout::{Geometry, LayoutNode, LayoutParser, SplitAxis};
pub use listing::{parse_pane_id, parse_session_list, parse_window_list};
pub use prefix::{PrefixKey, PrefixState, translate_command_key};
pub use protocol::{LineBuffer, Notification, ProtocolParser, unescape_octal};
pub use session_manager::{
    CommandHandle, CommandKind, CommandReply, LayoutUpdate, SessionEvent, SessionManager, TmuxTab,
};
pub use types::{
    PaneId, SessionInfo, SessionState, TabId, TmuxPaneId, TmuxSessionId, TmuxWindowId, WindowInfo,
};

pub use par_term_config::TmuxConfig;
