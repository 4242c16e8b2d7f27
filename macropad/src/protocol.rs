//! Line-oriented text protocol spoken with the keypad.
//!
//! Device to host: one key identifier per line, e.g. `KEY_1\n`.
//! Host to device: a status line `HH:MM|RAM: NN%\n`.

use std::collections::VecDeque;
use std::fmt;

/// Partial lines longer than this are discarded.
pub const MAX_LINE_LEN: usize = 256;

#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: VecDeque<u8>,
}

impl LineBuffer {
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes);
        if self.buf.len() > MAX_LINE_LEN && !self.buf.contains(&b'\n') {
            tracing::warn!(len = self.buf.len(), "discarding unterminated line");
            self.buf.clear();
        }
    }

    /// Returns the next complete, non-empty line with surrounding whitespace
    /// trimmed. Invalid UTF-8 sequences are dropped.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(end) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=end).collect();
            let line: String = raw.utf8_chunks().map(|chunk| chunk.valid()).collect();
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_owned());
            }
        }
        None
    }
}

/// Host status shown on the device display.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub hour: u32,
    pub minute: u32,
    pub memory_percent: f32,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}|RAM: {:.0}%",
            self.hour, self.minute, self.memory_percent
        )
    }
}

impl Status {
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}
