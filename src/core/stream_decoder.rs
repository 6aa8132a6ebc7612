//! Incremental decoder for `data: <json>` framed chat-completion streams.
//!
//! Bytes are buffered until a newline arrives, so records and multi-byte
//! characters may be split across reads arbitrarily.

use memchr::memchr;
use tracing::warn;

use crate::api::ChatResponse;

const DONE_MARKER: &str = "[DONE]";

/// One decoded line of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    Delta(String),
    Done,
    /// Blank lines, SSE comments, non-`data:` fields and deltas without text.
    Ignored,
    Malformed { payload: String, error: String },
}

/// What the decoder hands to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    /// Emitted exactly once, after the last fragment.
    Completed,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

pub fn parse_line(line: &str) -> StreamRecord {
    let line = line.trim();
    if line.is_empty() {
        return StreamRecord::Ignored;
    }

    let Some(payload) = extract_data_payload(line) else {
        return StreamRecord::Ignored;
    };

    if payload == DONE_MARKER {
        return StreamRecord::Done;
    }
    if payload.is_empty() {
        return StreamRecord::Ignored;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(StreamRecord::Delta)
            .unwrap_or(StreamRecord::Ignored),
        Err(err) => StreamRecord::Malformed {
            payload: payload.to_string(),
            error: err.to_string(),
        },
    }
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    completed: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete line in `bytes` plus whatever was buffered.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.completed {
            return events;
        }

        self.buffer.extend_from_slice(bytes);
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.handle_line(&line[..newline_pos], &mut events);
            if self.completed {
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// The body ended: decode any unterminated final line, then complete.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.completed {
            return events;
        }

        let remainder = std::mem::take(&mut self.buffer);
        if !remainder.is_empty() {
            self.handle_line(&remainder, &mut events);
        }
        if !self.completed {
            self.completed = true;
            events.push(StreamEvent::Completed);
        }
        events
    }

    fn handle_line(&mut self, raw: &[u8], events: &mut Vec<StreamEvent>) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "Skipping stream line with invalid UTF-8");
                return;
            }
        };

        match parse_line(line) {
            StreamRecord::Delta(content) => events.push(StreamEvent::Fragment(content)),
            StreamRecord::Done => {
                self.completed = true;
                events.push(StreamEvent::Completed);
            }
            StreamRecord::Ignored => {}
            StreamRecord::Malformed { payload, error } => {
                warn!(%error, %payload, "Skipping malformed stream record");
            }
        }
    }
}
