//! Parsers for `list-windows` / `list-sessions` command responses.
//!
//! Both are lenient per line: a malformed line is skipped and the rest of
//! the batch still parses.

use crate::types::{SessionInfo, TmuxPaneId, WindowInfo};
use regex::Regex;
use std::sync::OnceLock;

/// `<name>: <N> windows (created ...)[ (attached)]`
static SESSION_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn session_line_regex() -> &'static Regex {
    SESSION_LINE_REGEX.get_or_init(|| {
        // The name is greedy so colons inside it do not end it early; the
        // split point is the last ": <digits> windows" on the line.
        Regex::new(r"^(?P<name>.*): (?P<windows>\d+) windows?(?P<rest>.*)$")
            .expect("Failed to compile session line regex")
    })
}

/// Parse a `%<digits>` pane token, allowing trailing whitespace.
pub fn parse_pane_id(token: &str) -> Option<TmuxPaneId> {
    let digits = token.trim_end().strip_prefix('%')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse `list-windows -F '#{window_id}\t#{pane_id}\t#{window_name}'` output.
///
/// Only the first two tab-separated fields are structural; everything after
/// the second tab (embedded tabs included) is the window name.
pub fn parse_window_list(response: &str) -> Vec<WindowInfo> {
    response
        .lines()
        .filter_map(|line| {
            let window = parse_window_line(line);
            if window.is_none() && !line.trim().is_empty() {
                crate::debug_log!("TMUX", "Skipping malformed window line: {:?}", line);
            }
            window
        })
        .collect()
}

fn parse_window_line(line: &str) -> Option<WindowInfo> {
    let mut fields = line.splitn(3, '\t');
    let window_token = fields.next()?;
    let pane_token = fields.next()?;
    let name = fields.next().unwrap_or_default();

    let digits = window_token.strip_prefix('@')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let window_id = digits.parse().ok()?;
    let pane_id = parse_pane_id(pane_token)?;

    Some(WindowInfo::new(window_id, Some(pane_id), name))
}

/// Parse default-format `list-sessions` output.
pub fn parse_session_list(response: &str) -> Vec<SessionInfo> {
    response
        .lines()
        .filter_map(|line| {
            let session = parse_session_line(line);
            if session.is_none() && !line.trim().is_empty() {
                crate::debug_log!("TMUX", "Skipping malformed session line: {:?}", line);
            }
            session
        })
        .collect()
}

fn parse_session_line(line: &str) -> Option<SessionInfo> {
    let caps = session_line_regex().captures(line.trim_end())?;
    let name = caps.name("name")?.as_str();
    if name.is_empty() {
        return None;
    }
    let window_count = caps.name("windows")?.as_str().parse().ok()?;
    let is_attached = caps
        .name("rest")
        .is_some_and(|rest| rest.as_str().ends_with("(attached)"));

    Some(SessionInfo {
        name: name.to_string(),
        window_count,
        is_attached,
    })
}
