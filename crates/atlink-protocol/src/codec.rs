//! Line framing for modem communication.
//!
//! The modem emits text terminated with carriage return / line feed. Commands
//! are sent with a `\r\n` terminator; responses and unsolicited notifications
//! arrive as CR/LF-delimited lines. In prompt mode a designated byte (such as
//! `>` during a payload upload) also terminates a line, with no newline
//! required.

use bytes::BytesMut;

/// Default maximum line length, in bytes.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Byte sequence appended to every transmitted command.
pub const COMMAND_TERMINATOR: &[u8] = b"\r\n";

/// A framer that accumulates raw modem bytes into discrete lines.
///
/// This handles the line-oriented nature of the modem protocol:
/// - Accumulates received bytes until a CR or LF is found
/// - Never includes the delimiter in the delivered line
/// - In prompt mode, delivers the accumulator as soon as the prompt byte
///   arrives (prompt byte included)
///
/// Lines longer than the configured maximum are truncated: excess bytes are
/// discarded until the next delimiter, and the line is delivered with only
/// the first `max_line_length` bytes.
#[derive(Debug)]
pub struct LineFramer {
    /// Buffer for the line currently being accumulated.
    buffer: BytesMut,
    /// Maximum accumulated line length in bytes.
    max_line_length: usize,
    /// Whether the current line has overflowed the maximum.
    overflowed: bool,
    /// Count of lines delivered truncated.
    truncated_lines: u64,
}

impl LineFramer {
    /// Create a framer with the default maximum line length.
    pub fn new() -> Self {
        LineFramer::with_max_line_length(MAX_LINE_LENGTH)
    }

    /// Create a framer with an explicit maximum line length.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        LineFramer {
            buffer: BytesMut::with_capacity(max_line_length.min(MAX_LINE_LENGTH)),
            max_line_length,
            overflowed: false,
            truncated_lines: 0,
        }
    }

    /// Feed one received byte into the framer.
    ///
    /// Returns `Some(line)` when the byte completes a line:
    /// - a CR or LF byte delivers the accumulator if it is non-empty (the
    ///   delimiter itself is dropped);
    /// - when `prompt` is set and the byte equals it, the byte is appended
    ///   and the accumulator delivered immediately.
    ///
    /// Any other byte is appended and `None` is returned. Framing never
    /// fails; on transport interruption the framer simply stops receiving
    /// bytes.
    pub fn push_byte(&mut self, byte: u8, prompt: Option<u8>) -> Option<String> {
        if byte == b'\r' || byte == b'\n' {
            return self.take_line();
        }

        self.accumulate(byte);

        if prompt == Some(byte) {
            // The buffer holds at least the prompt byte, so this delivers.
            return self.take_line();
        }

        None
    }

    /// Encode a command for transmission, appending the CR/LF terminator.
    pub fn encode_command(command: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(command.len() + COMMAND_TERMINATOR.len());
        buf.extend_from_slice(command.as_bytes());
        buf.extend_from_slice(COMMAND_TERMINATOR);
        buf
    }

    /// Number of bytes currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of lines delivered truncated since construction.
    pub fn truncated_lines(&self) -> u64 {
        self.truncated_lines
    }

    /// Discard any partially accumulated line.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    fn accumulate(&mut self, byte: u8) {
        if self.buffer.len() < self.max_line_length {
            self.buffer.extend_from_slice(&[byte]);
        } else {
            self.overflowed = true;
        }
    }

    fn take_line(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        if self.overflowed {
            self.truncated_lines += 1;
        }
        let line = String::from_utf8_lossy(&self.buffer).to_string();
        self.buffer.clear();
        self.overflowed = false;
        Some(line)
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        LineFramer::new()
    }
}
