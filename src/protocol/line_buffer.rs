//! Line framing for the control mode byte stream.

/// Accumulates raw transport bytes and yields complete lines.
///
/// Lines are split on `\n`, a single trailing `\r` is stripped (tmux sends
/// `\r\n` when attached through a PTY), and bytes are decoded as UTF-8
/// lossily. `%output` payloads are octal-escaped by tmux so lossy decoding
/// never corrupts pane data.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty line buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append data and drain every complete line it finishes.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.pending.drain(..=newline_pos).collect();

            let mut end = line_bytes.len() - 1;
            if end > 0 && line_bytes[end - 1] == b'\r' {
                end -= 1;
            }
            lines.push(String::from_utf8_lossy(&line_bytes[..end]).into_owned());
        }
        lines
    }

    /// Discard any buffered partial line
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of buffered bytes not yet terminated by a newline
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no partial line is buffered
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
