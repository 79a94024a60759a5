//! tmux control protocol parser
//!
//! Control mode output is a single line-oriented stream mixing two kinds of
//! traffic:
//!
//! - Command responses, wrapped in `%begin`/`%end` (or `%begin`/`%error`)
//! - Asynchronous notifications starting with `%`, which may arrive at any
//!   time, including in the middle of an open response block
//!
//! `ProtocolParser::feed` takes one complete line at a time (see
//! `LineBuffer` for framing raw transport bytes) and returns at most one
//! `Notification`. Notifications inside an open block are emitted
//! immediately; they are never deferred until the block closes.
//!
//! # References
//!
//! - [Tmux Control Mode Wiki](https://github.com/tmux/tmux/wiki/Control-Mode)

mod escape;
mod line_buffer;

pub use escape::unescape_octal;
pub use line_buffer::LineBuffer;

use crate::types::{TmuxPaneId, TmuxSessionId, TmuxWindowId};

/// A decoded control mode message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Pane output (`%output %N data`), payload already unescaped
    Output { pane_id: TmuxPaneId, data: Vec<u8> },
    /// Flow-controlled pane output (`%extended-output %N age ... : data`)
    ExtendedOutput {
        pane_id: TmuxPaneId,
        delay_ms: u64,
        data: Vec<u8>,
    },
    /// Window added to the attached session
    WindowAdd(TmuxWindowId),
    /// Window closed in the attached session
    WindowClose(TmuxWindowId),
    /// Window renamed; the name is the verbatim rest of the line
    WindowRenamed { window_id: TmuxWindowId, name: String },
    /// Window layout changed
    LayoutChange {
        window_id: TmuxWindowId,
        layout: String,
        visible_layout: Option<String>,
    },
    /// Window's active pane changed
    WindowPaneChanged {
        window_id: TmuxWindowId,
        pane_id: TmuxPaneId,
    },
    /// This client is now attached to another session
    SessionChanged {
        session_id: TmuxSessionId,
        name: String,
    },
    /// A session was renamed
    SessionRenamed {
        session_id: TmuxSessionId,
        name: String,
    },
    /// A session's current window changed
    SessionWindowChanged {
        session_id: TmuxSessionId,
        window_id: TmuxWindowId,
    },
    /// A session was created or destroyed
    SessionsChanged,
    /// A pane entered or left a mode (copy mode, etc.)
    PaneModeChanged(TmuxPaneId),
    /// tmux stopped sending output for a pane (flow control)
    Pause(TmuxPaneId),
    /// tmux resumed output for a pane
    Continue(TmuxPaneId),
    /// Another client detached
    ClientDetached(String),
    /// A command response block ended successfully
    BlockEnd { command_number: u32, data: String },
    /// A command response block ended with an error
    BlockError { command_number: u32, data: String },
    /// The control client is exiting
    Exit(Option<String>),
    /// A `%` line this parser does not understand
    Unrecognized(String),
}

impl Notification {
    /// Protocol keyword for this notification, used in log output
    pub fn notification_type(&self) -> &'static str {
        match self {
            Self::Output { .. } => "output",
            Self::ExtendedOutput { .. } => "extended-output",
            Self::WindowAdd(_) => "window-add",
            Self::WindowClose(_) => "window-close",
            Self::WindowRenamed { .. } => "window-renamed",
            Self::LayoutChange { .. } => "layout-change",
            Self::WindowPaneChanged { .. } => "window-pane-changed",
            Self::SessionChanged { .. } => "session-changed",
            Self::SessionRenamed { .. } => "session-renamed",
            Self::SessionWindowChanged { .. } => "session-window-changed",
            Self::SessionsChanged => "sessions-changed",
            Self::PaneModeChanged(_) => "pane-mode-changed",
            Self::Pause(_) => "pause",
            Self::Continue(_) => "continue",
            Self::ClientDetached(_) => "client-detached",
            Self::BlockEnd { .. } => "end",
            Self::BlockError { .. } => "error",
            Self::Exit(_) => "exit",
            Self::Unrecognized(_) => "unknown",
        }
    }
}

/// Response block buffering state
#[derive(Debug, Default)]
enum BlockState {
    #[default]
    Idle,
    InBlock {
        command_number: u32,
        lines: Vec<String>,
    },
}

/// Block delimiter kinds that carry a `<time> <number> <flags>` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    Begin,
    End,
    Error,
}

/// Stateful parser for one control connection.
///
/// Holds only the transient buffer of the currently open response block.
/// Lines must be fed strictly in arrival order by a single driver.
#[derive(Debug, Default)]
pub struct ProtocolParser {
    state: BlockState,
}

impl ProtocolParser {
    /// Create a parser in the idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `%begin` block is currently open
    pub fn is_in_block(&self) -> bool {
        matches!(self.state, BlockState::InBlock { .. })
    }

    /// Drop any partially buffered block
    pub fn reset(&mut self) {
        self.state = BlockState::Idle;
    }

    /// Process one newline-delimited, CR-stripped line.
    pub fn feed(&mut self, line: &str) -> Option<Notification> {
        if let Some((Guard::Begin, command_number)) = parse_guard(line) {
            if let BlockState::InBlock {
                command_number: open,
                lines,
            } = &self.state
            {
                crate::debug_error!(
                    "TMUX",
                    "%begin {} while block {} still open, discarding {} buffered lines",
                    command_number,
                    open,
                    lines.len()
                );
            }
            self.state = BlockState::InBlock {
                command_number,
                lines: Vec::new(),
            };
            return None;
        }

        match &mut self.state {
            BlockState::InBlock { lines, .. } => {
                if let Some((guard @ (Guard::End | Guard::Error), command_number)) =
                    parse_guard(line)
                {
                    let data = lines.join("\n");
                    self.state = BlockState::Idle;
                    return Some(if guard == Guard::End {
                        Notification::BlockEnd {
                            command_number,
                            data,
                        }
                    } else {
                        Notification::BlockError {
                            command_number,
                            data,
                        }
                    });
                }
                if line.starts_with('%') {
                    return Some(parse_notification(line));
                }
                lines.push(line.to_string());
                None
            }
            BlockState::Idle => {
                if line.starts_with('%') {
                    Some(parse_notification(line))
                } else {
                    if !line.is_empty() {
                        crate::debug_trace!("TMUX", "Dropping non-protocol line: {}", line);
                    }
                    None
                }
            }
        }
    }

    /// Feed a sequence of lines, collecting every notification produced.
    pub fn feed_all<'a, I>(&mut self, lines: I) -> Vec<Notification>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines.into_iter().filter_map(|line| self.feed(line)).collect()
    }
}

/// Recognise `%begin`/`%end`/`%error <time> <number> [flags]`.
fn parse_guard(line: &str) -> Option<(Guard, u32)> {
    let (keyword, args) = split_keyword(line)?;
    let guard = match keyword {
        "begin" => Guard::Begin,
        "end" => Guard::End,
        "error" => Guard::Error,
        _ => return None,
    };
    let mut parts = args.split_whitespace();
    let _timestamp: u64 = parts.next()?.parse().ok()?;
    let command_number: u32 = parts.next()?.parse().ok()?;
    Some((guard, command_number))
}

/// Split `%keyword args` into its keyword and the raw argument text.
fn split_keyword(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix('%')?;
    Some(body.split_once(' ').unwrap_or((body, "")))
}

/// Parse a `@N`, `$N` or `%N` token.
fn parse_id(token: &str, prefix: char) -> Option<u64> {
    let digits = token.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a leading ID token, returning the ID and the unsplit remainder.
fn split_id(args: &str, prefix: char) -> Option<(u64, &str)> {
    let (token, rest) = args.split_once(' ').unwrap_or((args, ""));
    Some((parse_id(token, prefix)?, rest))
}

/// Top-level dispatch for a `%`-prefixed line. Never fails: anything that
/// does not decode becomes `Unrecognized`.
fn parse_notification(line: &str) -> Notification {
    decode_notification(line).unwrap_or_else(|| {
        crate::debug_trace!("TMUX", "Unrecognized notification: {}", line);
        Notification::Unrecognized(line.to_string())
    })
}

fn decode_notification(line: &str) -> Option<Notification> {
    let (keyword, args) = split_keyword(line)?;

    match keyword {
        "output" => {
            let (pane_id, payload) = split_id(args, '%')?;
            Some(Notification::Output {
                pane_id,
                data: unescape_octal(payload),
            })
        }
        "extended-output" => {
            let (pane_id, rest) = split_id(args, '%')?;
            let (meta, payload) = rest.split_once(" : ")?;
            let delay_ms = meta.split_whitespace().next()?.parse().ok()?;
            Some(Notification::ExtendedOutput {
                pane_id,
                delay_ms,
                data: unescape_octal(payload),
            })
        }
        "window-add" => Some(Notification::WindowAdd(parse_id(args.trim(), '@')?)),
        "window-close" => Some(Notification::WindowClose(parse_id(args.trim(), '@')?)),
        "window-renamed" => {
            let (window_id, name) = split_id(args, '@')?;
            Some(Notification::WindowRenamed {
                window_id,
                name: name.to_string(),
            })
        }
        "layout-change" => {
            let (window_id, rest) = split_id(args, '@')?;
            let mut parts = rest.split_whitespace();
            let layout = parts.next()?.to_string();
            let visible_layout = parts.next().map(str::to_string);
            Some(Notification::LayoutChange {
                window_id,
                layout,
                visible_layout,
            })
        }
        "window-pane-changed" => {
            let (window_id, rest) = split_id(args, '@')?;
            Some(Notification::WindowPaneChanged {
                window_id,
                pane_id: parse_id(rest.trim(), '%')?,
            })
        }
        "session-changed" => {
            let (session_id, name) = split_id(args, '$')?;
            Some(Notification::SessionChanged {
                session_id,
                name: name.to_string(),
            })
        }
        "session-renamed" => {
            let (session_id, name) = split_id(args, '$')?;
            Some(Notification::SessionRenamed {
                session_id,
                name: name.to_string(),
            })
        }
        "session-window-changed" => {
            let (session_id, rest) = split_id(args, '$')?;
            Some(Notification::SessionWindowChanged {
                session_id,
                window_id: parse_id(rest.trim(), '@')?,
            })
        }
        "sessions-changed" => Some(Notification::SessionsChanged),
        "pane-mode-changed" => Some(Notification::PaneModeChanged(parse_id(args.trim(), '%')?)),
        "pause" => Some(Notification::Pause(parse_id(args.trim(), '%')?)),
        "continue" => Some(Notification::Continue(parse_id(args.trim(), '%')?)),
        "client-detached" => Some(Notification::ClientDetached(args.to_string())),
        "exit" => {
            let reason = line.split_once(' ').map(|(_, reason)| reason.to_string());
            Some(Notification::Exit(reason))
        }
        // Block guards only have meaning while a block is open
        _ => None,
    }
}
