//! Error types for the tmux control mode engine.
//!
//! Protocol parsing never fails (see `protocol`); these errors surface only
//! through command completion handles and imperative operations.

use crate::types::{PaneId, TabId};
use thiserror::Error;

/// Errors produced by command submission and completion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TmuxError {
    /// tmux answered the command with a `%error` block
    #[error("tmux command {command_number} failed: {message}")]
    CommandFailed { command_number: u32, message: String },

    /// The control connection ended while the command was outstanding
    #[error("tmux connection closed{}", closed_suffix(.reason))]
    ConnectionClosed { reason: Option<String> },

    /// No tmux pane is bound to this local pane
    #[error("pane {0} is not bound to a tmux pane")]
    UnknownPane(PaneId),

    /// No tmux window is bound to this tab
    #[error("tab {0} is not bound to a tmux window")]
    UnknownTab(TabId),

    /// The outbound channel refused the command line
    #[error("control channel error: {0}")]
    Channel(String),

    /// The completion handle was dropped without being fulfilled
    #[error("command completion dropped")]
    Dropped,
}

fn closed_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, TmuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_closed_display() {
        let err = TmuxError::ConnectionClosed {
            reason: Some("detached".to_string()),
        };
        assert_eq!(err.to_string(), "tmux connection closed: detached");

        let err = TmuxError::ConnectionClosed { reason: None };
        assert_eq!(err.to_string(), "tmux connection closed");
    }

    #[test]
    fn test_command_failed_display() {
        let err = TmuxError::CommandFailed {
            command_number: 7,
            message: "can't find pane: %9".to_string(),
        };
        assert_eq!(err.to_string(), "tmux command 7 failed: can't find pane: %9");
    }
}
