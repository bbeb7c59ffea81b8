/**
 * Streaming Relay
 *
 * Turns the generation service's NDJSON response into SSE events for the
 * browser. Each chunk with content becomes
 *
 * ```text
 * data: {"delta":"...","done":false}
 * ```
 *
 * and the stream always ends with exactly one `{"delta":"","done":true}`,
 * whether the upstream sent its final chunk, closed early, or failed.
 * Lines that are not valid JSON are skipped, and so is any line longer
 * than [`MAX_LINE_BYTES`].
 */

use std::collections::VecDeque;
use std::convert::Infallible;

use axum::response::sse::Event;
use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use serde::Serialize;

use crate::backend::llm::client::WireResponse;

/// One SSE payload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreamDelta {
    pub delta: String,
    pub done: bool,
}

impl StreamDelta {
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            done: false,
        }
    }

    pub fn finished() -> Self {
        Self {
            delta: String::new(),
            done: true,
        }
    }

    /// JSON text of this delta, as sent over a WebSocket
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("[Llm] Failed to encode stream delta: {}", e);
            r#"{"delta":"","done":true}"#.to_string()
        })
    }

    fn into_event(self) -> Event {
        Event::default().json_data(&self).unwrap_or_else(|e| {
            tracing::warn!("[Llm] Failed to encode stream delta: {}", e);
            Event::default().data(r#"{"delta":"","done":true}"#)
        })
    }
}

/// Longest NDJSON line the decoder will buffer
pub const MAX_LINE_BYTES: usize = 2 * 1024 * 1024;

/// Line splitter over NDJSON bytes
///
/// Holds at most one partial line. A line that grows past
/// [`MAX_LINE_BYTES`] is dropped and everything up to its newline discarded.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    // bytes of `buffer` already known to contain no newline
    scanned: usize,
    discarding: bool,
}

impl NdjsonDecoder {
    /// Feed bytes; returns the deltas of every completed line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamDelta> {
        self.buffer.extend_from_slice(bytes);
        let mut deltas = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > MAX_LINE_BYTES {
                tracing::warn!("[Llm] Dropping stream line of {} bytes", line.len());
                continue;
            }
            decode_line(&line, &mut deltas);
        }
        self.scanned = self.buffer.len();
        if self.buffer.len() > MAX_LINE_BYTES {
            if !self.discarding {
                tracing::warn!("[Llm] Stream line exceeds {} bytes, discarding", MAX_LINE_BYTES);
            }
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        deltas
    }

    /// Decode whatever is left after the upstream closed
    pub fn finish(&mut self) -> Vec<StreamDelta> {
        let line = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let mut deltas = Vec::new();
        if !std::mem::take(&mut self.discarding) {
            decode_line(&line, &mut deltas);
        }
        deltas
    }
}

fn decode_line(line: &[u8], out: &mut Vec<StreamDelta>) {
    let Ok(text) = std::str::from_utf8(line) else {
        return;
    };
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let Ok(chunk) = serde_json::from_str::<WireResponse>(text) else {
        tracing::debug!("[Llm] Skipping non-JSON stream line");
        return;
    };
    if !chunk.message.content.is_empty() {
        out.push(StreamDelta::content(chunk.message.content));
    }
    if chunk.done {
        out.push(StreamDelta::finished());
    }
}

struct RelayState<S> {
    upstream: S,
    decoder: NdjsonDecoder,
    pending: VecDeque<StreamDelta>,
    finished: bool,
}

/// Relay an upstream byte stream as deltas, ending with one `done` delta
pub fn relay_deltas<S, E>(upstream: S) -> impl Stream<Item = StreamDelta>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let state = RelayState {
        upstream,
        decoder: NdjsonDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }
            if let Some(delta) = state.pending.pop_front() {
                state.finished = delta.done;
                return Some((delta, state));
            }
            match state.upstream.next().await {
                Some(Ok(bytes)) => state.pending.extend(state.decoder.push(&bytes)),
                Some(Err(e)) => {
                    tracing::warn!("[Llm] Upstream stream failed: {}", e);
                    state.pending.push_back(StreamDelta::finished());
                }
                None => {
                    state.pending.extend(state.decoder.finish());
                    state.pending.push_back(StreamDelta::finished());
                }
            }
        }
    })
}

/// Relay an upstream byte stream as SSE events
pub fn sse_events<S, E>(upstream: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    relay_deltas(upstream).map(|delta| Ok(delta.into_event()))
}

/// `{"error": "...", "done": true}`
pub fn error_frame(message: &str) -> String {
    serde_json::json!({ "error": message, "done": true }).to_string()
}

/// The single event sent when the stream could not be started
pub fn error_event(message: &str) -> Event {
    Event::default().data(error_frame(message))
}
