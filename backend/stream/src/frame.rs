//! Incremental frame extraction.
//!
//! A frame is one `data: {json}` unit terminated by a newline. Text after the
//! last newline is kept in the buffer until a later read completes it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::decoder::Utf8StreamDecoder;

/// `data:` marker, a JSON object on the same line, optional whitespace, newline.
static FRAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"data:\s*(\{.*?\})\s*\n").unwrap());

/// Result of parsing one frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Non-empty `content` string.
    Content(String),
    /// Valid JSON without usable content (missing, empty, or not a string).
    Empty,
    /// Payload that is not valid JSON.
    Malformed { payload: String, error: String },
}

/// Decodes reads and splits the accumulated text into complete frames.
#[derive(Debug, Default)]
pub struct FrameParser {
    decoder: Utf8StreamDecoder,
    buffer: String,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read. Returns `None` while no newline has been seen, otherwise
    /// the frames found in everything up to and including the last newline.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<Vec<Frame>> {
        let text = self.decoder.decode(bytes);
        self.buffer.push_str(&text);

        let cut = self.buffer.rfind('\n')? + 1;
        let remainder = self.buffer.split_off(cut);
        let complete = std::mem::replace(&mut self.buffer, remainder);
        Some(parse_frames(&complete))
    }

    /// Text received after the last newline.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Consume the parser, returning the unterminated remainder.
    pub fn into_remainder(mut self) -> String {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);
        self.buffer
    }
}

/// Parse every frame in a block of newline-terminated text, in order.
pub fn parse_frames(complete: &str) -> Vec<Frame> {
    FRAME_PATTERN
        .captures_iter(complete)
        .filter_map(|caps| caps.get(1))
        .map(|m| parse_payload(m.as_str()))
        .collect()
}

fn parse_payload(payload: &str) -> Frame {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => match value.get("content").and_then(Value::as_str) {
            Some(content) if !content.is_empty() => Frame::Content(content.to_string()),
            _ => Frame::Empty,
        },
        Err(e) => Frame::Malformed {
            payload: payload.to_string(),
            error: e.to_string(),
        },
    }
}
