//! Shared integration test helpers for par-term-tmux.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{RecordingChannel, connected_client};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers are used per file.

#![allow(dead_code)]

use par_term_tmux::{
    ControlChannel, ControlClient, Notification, ProtocolParser, SessionEvent, TmuxConfig,
    TmuxError,
};

/// Control channel that records every line sent through it.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub sent: Vec<String>,
    /// When set, every send fails with a channel error
    pub fail: bool,
}

impl ControlChannel for RecordingChannel {
    fn send_line(&mut self, line: &str) -> par_term_tmux::Result<()> {
        if self.fail {
            return Err(TmuxError::Channel("recording channel closed".to_string()));
        }
        self.sent.push(line.to_string());
        Ok(())
    }
}

/// Config with a fixed tmux path and no bootstrap extras.
pub fn test_config() -> TmuxConfig {
    TmuxConfig {
        tmux_path: "tmux".to_string(),
        window_size_smallest: false,
        initial_client_size: None,
        ..TmuxConfig::default()
    }
}

/// Feed lines through a fresh parser and collect the notifications.
pub fn parse_lines(lines: &[&str]) -> Vec<Notification> {
    let mut parser = ProtocolParser::new();
    parser.feed_all(lines.iter().copied())
}

/// Feed several lines to a client, collecting all events.
pub fn feed<C: ControlChannel>(client: &mut ControlClient<C>, lines: &[&str]) -> Vec<SessionEvent> {
    lines
        .iter()
        .flat_map(|line| client.feed_line(line))
        .collect()
}

/// Answer the oldest outstanding command with a `%begin`/`%end` block.
pub fn reply<C: ControlChannel>(
    client: &mut ControlClient<C>,
    command_number: u32,
    body: &[&str],
) -> Vec<SessionEvent> {
    let mut events = client.feed_line(&format!("%begin 1700000000 {} 1", command_number));
    for line in body {
        events.extend(client.feed_line(line));
    }
    events.extend(client.feed_line(&format!("%end 1700000000 {} 1", command_number)));
    events
}

/// Answer the oldest outstanding command with a `%begin`/`%error` block.
pub fn reply_error<C: ControlChannel>(
    client: &mut ControlClient<C>,
    command_number: u32,
    message: &str,
) -> Vec<SessionEvent> {
    let mut events = client.feed_line(&format!("%begin 1700000000 {} 1", command_number));
    events.extend(client.feed_line(message));
    events.extend(client.feed_line(&format!("%error 1700000000 {} 1", command_number)));
    events
}

/// A client that has gone through the attach handshake.
///
/// With `test_config` the bootstrap sends `list-windows` then
/// `list-sessions`; both are still outstanding when this returns.
pub fn connected_client() -> ControlClient<RecordingChannel> {
    let mut client = ControlClient::new(RecordingChannel::default(), test_config());
    feed(
        &mut client,
        &[
            "%begin 1700000000 100 0",
            "%end 1700000000 100 0",
            "%session-changed $1 main",
        ],
    );
    client
}

/// A connected client whose bootstrap queries have been answered with
/// windows `@0` (pane `%0`, "bash") and `@1` (pane `%3`, "vim").
pub fn client_with_windows() -> ControlClient<RecordingChannel> {
    let mut client = connected_client();
    reply(&mut client, 101, &["@0\t%0\tbash", "@1\t%3\tvim"]);
    reply(
        &mut client,
        102,
        &["main: 2 windows (created Sat Feb 15 10:00:00 2026) (attached)"],
    );
    client
}
