//! Incremental decoding of the chat event stream.
//!
//! The server answers `POST /api/chat` with lines of the form
//! `data: {"content": "..."}`, `data: {"done": true}` or
//! `data: {"error": "..."}`, interleaved with other SSE fields and blank
//! lines. Transport chunks may split a line anywhere, including inside a
//! multi-byte character, so lines are only decoded once their terminating
//! newline has arrived.

use serde_json::Value;

/// Prefix marking a line that carries one JSON event
pub const DATA_PREFIX: &str = "data: ";

/// One decoded stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatDelta {
    Content(String),
    Done,
    Error(String),
}

/// Decode a single line of server output.
///
/// Returns `None` for lines without the `data: ` prefix, for malformed JSON
/// and for events whose known fields are all missing, false or empty.
pub fn decode_line(line: &str) -> Option<ChatDelta> {
    let payload = line.trim().strip_prefix(DATA_PREFIX)?;
    let event: Value = serde_json::from_str(payload).ok()?;

    if event.get("done").map(is_truthy).unwrap_or(false) {
        return Some(ChatDelta::Done);
    }
    match event.get("content").and_then(Value::as_str) {
        Some(content) if !content.is_empty() => return Some(ChatDelta::Content(content.to_string())),
        _ => {}
    }
    event
        .get("error")
        .and_then(Value::as_str)
        .filter(|error| !error.is_empty())
        .map(|error| ChatDelta::Error(error.to_string()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Accumulator for one outstanding chat request.
///
/// `buffer` holds every byte received so far; `received_length` marks how
/// much of it has already been handed out as complete lines.
#[derive(Debug, Default)]
pub struct StreamState {
    received_length: usize,
    buffer: Vec<u8>,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received_length(&self) -> usize {
        self.received_length
    }

    /// Full response received so far
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Append newly arrived bytes and return every line they complete.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let pending = &self.buffer[self.received_length..];
        let Some(last_newline) = pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let complete = &pending[..last_newline];
        let lines = complete
            .split(|b| *b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        self.received_length += last_newline + 1;
        lines
    }

    /// Hand out the trailing line once the body has ended, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.received_length >= self.buffer.len() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.buffer[self.received_length..]).into_owned();
        self.received_length = self.buffer.len();
        Some(rest)
    }

    /// `push` followed by decoding
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ChatDelta> {
        self.push(chunk)
            .iter()
            .filter_map(|line| decode_line(line))
            .collect()
    }

    /// `finish` followed by decoding
    pub fn finish_decoded(&mut self) -> Option<ChatDelta> {
        self.finish().as_deref().and_then(decode_line)
    }
}
