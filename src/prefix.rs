//! Prefix key handling for control mode
//!
//! In a normal tmux client the prefix key (default Ctrl+B) arms tmux's own
//! key table. A control client receives no key table, so the prefix is
//! intercepted locally and the following key is translated into the
//! equivalent tmux command.

use crate::commands::TmuxCommand;
use crate::layout::SplitAxis;
use crate::types::TmuxPaneId;
use winit::keyboard::{Key, ModifiersState, NamedKey};

/// Parsed prefix key configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixKey {
    /// Whether Ctrl modifier is required
    pub ctrl: bool,
    /// Whether Alt/Option modifier is required
    pub alt: bool,
    /// Whether Shift modifier is required
    pub shift: bool,
    /// The base key
    pub key: PrefixKeyType,
}

/// The type of key in the prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixKeyType {
    /// A character key (lowercased)
    Char(char),
    /// Space key
    Space,
    /// Other named key
    Named(String),
}

impl PrefixKey {
    /// Parse a prefix key string like "C-b", "C-Space", "M-a", "C-M-x"
    ///
    /// `C-` is Ctrl, `M-` (or `A-`) is Alt/Meta, `S-` is Shift, followed by a
    /// single letter or a key name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let mut ctrl = false;
        let mut alt = false;
        let mut shift = false;
        let mut remaining = s;

        loop {
            if let Some(rest) = remaining.strip_prefix("C-") {
                ctrl = true;
                remaining = rest;
            } else if let Some(rest) = remaining
                .strip_prefix("M-")
                .or_else(|| remaining.strip_prefix("A-"))
            {
                alt = true;
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix("S-") {
                shift = true;
                remaining = rest;
            } else {
                break;
            }
        }

        if remaining.is_empty() {
            return None;
        }

        let key = if remaining.eq_ignore_ascii_case("space") {
            PrefixKeyType::Space
        } else if remaining.chars().count() == 1 {
            PrefixKeyType::Char(remaining.chars().next()?.to_ascii_lowercase())
        } else {
            PrefixKeyType::Named(remaining.to_string())
        };

        Some(Self {
            ctrl,
            alt,
            shift,
            key,
        })
    }

    /// Check if a key event matches this prefix key
    pub fn matches(&self, key: &Key, modifiers: ModifiersState) -> bool {
        if self.ctrl != modifiers.control_key()
            || self.alt != modifiers.alt_key()
            || self.shift != modifiers.shift_key()
        {
            return false;
        }

        match (&self.key, key) {
            (PrefixKeyType::Space, Key::Named(NamedKey::Space)) => true,
            (PrefixKeyType::Char(c), Key::Character(s)) => {
                s.chars().next().map(|k| k.to_ascii_lowercase()) == Some(*c)
            }
            _ => false,
        }
    }
}

/// Whether the prefix has been pressed and the next key is a command key
#[derive(Debug, Clone, Default)]
pub struct PrefixState {
    in_prefix_mode: bool,
}

impl PrefixState {
    /// Create a new prefix state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if we're in prefix mode
    pub fn is_active(&self) -> bool {
        self.in_prefix_mode
    }

    /// Enter prefix mode
    pub fn enter(&mut self) {
        self.in_prefix_mode = true;
    }

    /// Exit prefix mode
    pub fn exit(&mut self) {
        self.in_prefix_mode = false;
    }
}

/// Translate the key pressed after the prefix into a tmux command.
///
/// Pane-level commands target `focused_pane` when one is known. Returns
/// `None` for keys with no default tmux binding.
pub fn translate_command_key(key: &Key, focused_pane: Option<TmuxPaneId>) -> Option<TmuxCommand> {
    let target = |cmd: &str| -> TmuxCommand {
        match focused_pane {
            Some(pane_id) => TmuxCommand::raw(format!("{} -t %{}", cmd, pane_id)),
            None => TmuxCommand::raw(cmd),
        }
    };

    match key {
        Key::Character(s) => {
            let c = s.chars().next()?;
            match c {
                // Window commands
                'c' => Some(TmuxCommand::new_window(None)),
                'n' => Some(TmuxCommand::raw("next-window")),
                'p' => Some(TmuxCommand::raw("previous-window")),
                'l' => Some(TmuxCommand::raw("last-window")),
                '&' => Some(TmuxCommand::raw("kill-window")),
                '0'..='9' => Some(TmuxCommand::raw(format!("select-window -t :{}", c))),

                // Pane commands
                '%' => Some(match focused_pane {
                    Some(pane_id) => TmuxCommand::split_pane(SplitAxis::Horizontal, pane_id),
                    None => TmuxCommand::raw("split-window -h"),
                }),
                '"' => Some(match focused_pane {
                    Some(pane_id) => TmuxCommand::split_pane(SplitAxis::Vertical, pane_id),
                    None => TmuxCommand::raw("split-window -v"),
                }),
                'x' => Some(match focused_pane {
                    Some(pane_id) => TmuxCommand::kill_pane(pane_id),
                    None => TmuxCommand::raw("kill-pane"),
                }),
                'o' => Some(TmuxCommand::raw("select-pane -t :.+")),
                ';' => Some(TmuxCommand::raw("last-pane")),
                'z' => Some(target("resize-pane -Z")),
                '{' => Some(target("swap-pane -U")),
                '}' => Some(target("swap-pane -D")),
                '!' => Some(target("break-pane")),
                'h' => Some(target("select-pane -L")),
                'j' => Some(target("select-pane -D")),
                'k' => Some(target("select-pane -U")),

                // Session commands
                'd' => Some(TmuxCommand::detach()),
                '(' => Some(TmuxCommand::raw("switch-client -p")),
                ')' => Some(TmuxCommand::raw("switch-client -n")),
                'L' => Some(TmuxCommand::raw("switch-client -l")),

                // Copy mode
                '[' => Some(target("copy-mode")),
                ']' => Some(target("paste-buffer")),

                ' ' => Some(TmuxCommand::raw("next-layout")),
                _ => None,
            }
        }
        Key::Named(NamedKey::Space) => Some(TmuxCommand::raw("next-layout")),
        Key::Named(NamedKey::ArrowUp) => Some(target("select-pane -U")),
        Key::Named(NamedKey::ArrowDown) => Some(target("select-pane -D")),
        Key::Named(NamedKey::ArrowLeft) => Some(target("select-pane -L")),
        Key::Named(NamedKey::ArrowRight) => Some(target("select-pane -R")),
        _ => None,
    }
}
