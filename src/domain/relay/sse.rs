//! Line framing for the provider's SSE-like transport.
//!
//! Network chunks do not respect line boundaries, so bytes are buffered until
//! a `\n` arrives. Complete lines are decoded lossily: a newline is ASCII, so
//! a multi-byte character can never straddle two complete lines.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

/// Prefix of the only line type the relay interprets.
pub const DATA_PREFIX: &str = "data: ";

/// Sentinel some providers send after the last chunk.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental byte-to-line decoder.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes, returning every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&raw[..raw.len() - 1]));
        }
        lines
    }

    /// Flushes a trailing line that had no terminating newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Classification of one transport line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Blank line, comment, unknown field, empty payload or `[DONE]`.
    Ignored,
    /// Trimmed payload of a `data: ` line.
    Data(&'a str),
}

/// Classifies a single line.
pub fn classify_line(line: &str) -> SseLine<'_> {
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Ignored;
    }

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Ignored;
    };

    let payload = payload.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return SseLine::Ignored;
    }
    SseLine::Data(payload)
}

struct LineState<S> {
    inner: Pin<Box<S>>,
    decoder: SseLineDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turns a stream of byte chunks into a stream of text lines.
///
/// A transport error is yielded once and ends the stream.
pub fn into_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Send,
{
    let state = LineState {
        inner: Box::pin(bytes),
        decoder: SseLineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }
            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.decoder.push(chunk.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if let Some(rest) = state.decoder.finish() {
                        state.pending.push_back(rest);
                    }
                }
            }
        }
    })
}
