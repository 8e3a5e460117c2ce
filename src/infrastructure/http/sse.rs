//! Incremental parser for the speech API's `text/event-stream` responses.
//!
//! Frames are assembled from `data:` lines and resolved on a blank line.
//! `speech.audio.delta` frames yield their base64-decoded `audio` field,
//! `speech.audio.done` (or a literal `[DONE]`) ends the stream. Bad frames are
//! skipped, never fatal.

use crate::domain::shared::redact;
use crate::error::{AppError, AppResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Upper bound on buffered, not yet line-split text
pub const MAX_SSE_BUFFER_BYTES: usize = 1_000_000;

/// How much of a discarded payload is echoed to the debug log
const DISCARDED_PREFIX_CHARS: usize = 128;

pub const AUDIO_DELTA_EVENT: &str = "speech.audio.delta";
pub const AUDIO_DONE_EVENT: &str = "speech.audio.done";

/// One resolved frame
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// Base64 audio fragment
    AudioDelta(String),
    Done,
    /// Any other event type (or a delta without usable audio)
    Other(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Accumulating,
    Done,
}

#[derive(Debug)]
pub struct SseFrameParser {
    buffer: String,
    data_lines: Vec<String>,
    state: ParserState,
}

impl Default for SseFrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SseFrameParser {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            data_lines: Vec::new(),
            state: ParserState::Accumulating,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consume one raw read and return the audio chunks it completed, in order.
    ///
    /// Nothing is returned once the parser is done, even if `raw` holds more
    /// frames.
    pub fn feed(&mut self, raw: &[u8]) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        if self.is_done() || raw.is_empty() {
            return chunks;
        }

        let Ok(text) = std::str::from_utf8(raw) else {
            tracing::warn!(chunk_size = raw.len(), "Non UTF-8 data in SSE stream; dropping chunk");
            return chunks;
        };

        self.buffer.push_str(text);
        if self.buffer.len() > MAX_SSE_BUFFER_BYTES {
            tracing::warn!(
                limit = MAX_SSE_BUFFER_BYTES,
                "SSE buffer exceeded limit; resetting"
            );
            self.buffer.clear();
            self.data_lines.clear();
            return chunks;
        }

        while let Some(newline) = self.buffer.find('\n') {
            let rest = self.buffer.split_off(newline + 1);
            let mut line = std::mem::replace(&mut self.buffer, rest);
            line.truncate(newline);
            let line = line.trim_end_matches('\r');

            if let Some(chunk) = self.process_line(line) {
                chunks.push(chunk);
            }
            if self.is_done() {
                self.buffer.clear();
                break;
            }
        }

        chunks
    }

    /// Flush whatever is pending at end of input.
    ///
    /// A trailing line without a newline counts as a line, and pending data
    /// lines are resolved as if a blank line had arrived.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.is_done() {
            return None;
        }

        let tail = std::mem::take(&mut self.buffer);
        let tail = tail.trim_end_matches('\r');
        if !tail.is_empty() {
            // Never a blank line here, so this only records data
            self.process_line(tail);
        }

        let chunk = self.flush_frame();
        self.state = ParserState::Done;
        chunk
    }

    fn process_line(&mut self, line: &str) -> Option<Bytes> {
        if line.is_empty() {
            return self.flush_frame();
        }

        // Comment / heartbeat
        if line.starts_with(':') {
            return None;
        }

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            self.data_lines.push(data.to_string());
        }

        // event:, id:, retry: carry nothing we use
        None
    }

    fn flush_frame(&mut self) -> Option<Bytes> {
        if self.data_lines.is_empty() {
            return None;
        }
        let payload = self.data_lines.join("\n");
        self.data_lines.clear();

        match parse_event(&payload)? {
            SseEvent::AudioDelta(audio) => match BASE64.decode(audio.as_bytes()) {
                Ok(decoded) if !decoded.is_empty() => Some(Bytes::from(decoded)),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid audio chunk in SSE stream");
                    None
                }
            },
            SseEvent::Done => {
                self.state = ParserState::Done;
                None
            }
            SseEvent::Other(kind) => {
                tracing::trace!(event_type = ?kind, "Ignoring SSE event");
                None
            }
        }
    }
}

/// Interpret one frame's joined data lines
pub fn parse_event(payload: &str) -> Option<SseEvent> {
    let data = payload.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(_) => {
            let prefix: String = data.chars().take(DISCARDED_PREFIX_CHARS).collect();
            tracing::debug!(payload_prefix = %redact(&prefix), "Discarding invalid SSE payload");
            return None;
        }
    };

    let kind = value.get("type").and_then(|t| t.as_str());
    match kind {
        Some(AUDIO_DELTA_EVENT) => match value.get("audio").and_then(|a| a.as_str()) {
            Some(audio) if !audio.is_empty() => Some(SseEvent::AudioDelta(audio.to_string())),
            _ => Some(SseEvent::Other(Some(AUDIO_DELTA_EVENT.to_string()))),
        },
        Some(AUDIO_DONE_EVENT) => Some(SseEvent::Done),
        other => Some(SseEvent::Other(other.map(str::to_string))),
    }
}

/// Turn an SSE byte stream into decoded audio chunks as frames resolve.
///
/// Transport errors from `body` are passed through; the stream ends at the
/// done event without reading further.
pub fn audio_deltas<S, E>(body: S) -> impl Stream<Item = AppResult<Bytes>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    async_stream::stream! {
        let mut parser = SseFrameParser::new();
        let mut body = Box::pin(body);

        while let Some(raw) = body.next().await {
            let raw = match raw {
                Ok(raw) => raw,
                Err(e) => {
                    yield Err::<Bytes, AppError>(e.into());
                    return;
                }
            };
            for chunk in parser.feed(&raw) {
                yield Ok(chunk);
            }
            if parser.is_done() {
                return;
            }
        }

        if let Some(chunk) = parser.finish() {
            yield Ok(chunk);
        }
    }
}
