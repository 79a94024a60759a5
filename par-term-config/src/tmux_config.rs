//! tmux integration settings.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings for the tmux control mode integration.
///
/// Every field carries a serde default so config files written by older
/// versions keep loading after new fields are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TmuxConfig {
    /// Path to tmux executable (default: first `tmux` found on PATH)
    #[serde(default = "crate::defaults::tmux_path")]
    pub tmux_path: String,

    /// Default session name when creating new tmux sessions
    #[serde(default = "crate::defaults::default_session")]
    pub default_session: Option<String>,

    /// Attach to an existing session instead of creating one
    #[serde(default = "crate::defaults::bool_false")]
    pub auto_attach: bool,

    /// Session name to attach to (if `auto_attach` is true)
    #[serde(default = "crate::defaults::auto_attach_session")]
    pub auto_attach_session: Option<String>,

    /// Prefix key intercepted while in control mode (tmux notation, e.g. "C-b")
    #[serde(default = "crate::defaults::prefix_key")]
    pub prefix_key: String,

    /// Send `set-option -g window-size smallest` once connected so tmux
    /// respects this client's size when larger clients are attached
    #[serde(default = "crate::defaults::bool_true")]
    pub window_size_smallest: bool,

    /// Client size `(cols, rows)` announced with `refresh-client -C` on connect
    #[serde(default = "crate::defaults::initial_client_size")]
    pub initial_client_size: Option<(usize, usize)>,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            tmux_path: crate::defaults::tmux_path(),
            default_session: crate::defaults::default_session(),
            auto_attach: crate::defaults::bool_false(),
            auto_attach_session: crate::defaults::auto_attach_session(),
            prefix_key: crate::defaults::prefix_key(),
            window_size_smallest: crate::defaults::bool_true(),
            initial_client_size: crate::defaults::initial_client_size(),
        }
    }
}

impl TmuxConfig {
    /// Check field values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tmux_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tmux_path must not be empty".to_string(),
            ));
        }
        if self.prefix_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "prefix_key must not be empty".to_string(),
            ));
        }
        if let Some((cols, rows)) = self.initial_client_size
            && (cols == 0 || rows == 0)
        {
            return Err(ConfigError::Validation(format!(
                "initial_client_size must be non-zero, got {cols}x{rows}"
            )));
        }
        Ok(())
    }

    /// The session name to use for a launch command, if any.
    ///
    /// `auto_attach_session` wins when `auto_attach` is enabled.
    pub fn effective_session_name(&self) -> Option<&str> {
        if self.auto_attach
            && let Some(name) = self.auto_attach_session.as_deref()
        {
            return Some(name);
        }
        self.default_session.as_deref()
    }
}
