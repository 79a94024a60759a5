//! Outbound side of a control connection.

use crate::error::{Result, TmuxError};
use tokio::sync::mpsc::UnboundedSender;

/// Accepts command lines for transmission to tmux.
///
/// Implementations must deliver lines in the order they are sent; the
/// transport itself (PTY, process stdin, socket) is up to the implementor.
pub trait ControlChannel {
    /// Send one command line. `line` carries no trailing newline.
    fn send_line(&mut self, line: &str) -> Result<()>;
}

/// Lines are forwarded newline-terminated to whatever task owns the writer.
impl ControlChannel for UnboundedSender<String> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        self.send(format!("{}\n", line))
            .map_err(|_| TmuxError::Channel("control channel receiver dropped".to_string()))
    }
}

impl<T: ControlChannel + ?Sized> ControlChannel for Box<T> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        (**self).send_line(line)
    }
}
