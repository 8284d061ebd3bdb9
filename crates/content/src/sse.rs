//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; a frame is dispatched on the blank
//! line that terminates it. Comment lines (`:`) are keep-alives and are
//! dropped.

use crate::error::ContentError;

/// Longest line the decoder buffers while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name; `"message"` when the frame did not name one.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Bytes of `buf` already known to hold no line terminator.
    scanned: usize,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame it completed.
    ///
    /// Fails once an unterminated line grows past [`MAX_LINE_BYTES`]; the
    /// decoder is reset and the stream should be treated as broken.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, ContentError> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            let line = {
                let raw = &self.buf[start..end];
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
                String::from_utf8_lossy(raw).into_owned()
            };
            start = end + 1;
            self.scanned = start;

            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        self.buf.drain(..start);
        self.scanned = self.buf.len();

        if self.buf.len() > MAX_LINE_BYTES {
            let len = self.buf.len();
            *self = Self::default();
            return Err(ContentError::LineTooLong(len));
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // `retry` and unknown fields are ignored.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }

        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
            id,
        })
    }
}
