//! Stream reducer - folds a provider event stream into one result.
//!
//! The provider streams `data: {json}` lines. Each chunk may carry an
//! `answer` fragment; the chunk flagged `is_completion` ends the stream.
//!
//! # Accumulation rules
//!
//! - `answer` of the result is always the in-order concatenation of every
//!   non-empty fragment seen so far.
//! - Every non-answer field of a non-terminal chunk is shallow-merged into
//!   the result (last writer wins), so auxiliary fields from intermediate
//!   chunks survive.
//! - The terminal chunk replaces the result wholesale, then its `answer` is
//!   overwritten with the full concatenation.
//! - Payloads that are not JSON objects are logged and skipped, never fatal.
//!   Objects are always used: a non-string `answer` contributes no text and
//!   only a boolean `true` marks completion.
//! - EOF without a terminal chunk keeps whatever was accumulated.

use futures::{Stream, StreamExt};

use super::aggregate::{AggregatedResult, ChunkDecodeError, StreamChunk, ANSWER};
use super::sse::{classify_line, SseLine};

/// Whether the reducer wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceStep {
    Continue,
    /// A completion chunk arrived; further lines are ignored.
    Complete,
}

/// Incremental reducer state.
#[derive(Debug, Default)]
pub struct StreamReducer {
    full_answer: String,
    result: AggregatedResult,
    completed: bool,
    chunks: usize,
    malformed: usize,
}

impl StreamReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one transport line.
    pub fn push_line(&mut self, line: &str) -> ReduceStep {
        if self.completed {
            return ReduceStep::Complete;
        }

        let SseLine::Data(payload) = classify_line(line) else {
            return ReduceStep::Continue;
        };

        match StreamChunk::parse(payload) {
            Ok(chunk) => self.push_chunk(chunk),
            Err(e) => {
                self.skip_malformed(payload, &e);
                ReduceStep::Continue
            }
        }
    }

    /// Records a payload that could not be decoded.
    pub fn skip_malformed(&mut self, payload: &str, error: &ChunkDecodeError) {
        self.malformed += 1;
        tracing::warn!(error = %error, payload = %payload, "Skipping malformed stream chunk");
    }

    /// Feeds one already-decoded chunk.
    pub fn push_chunk(&mut self, chunk: StreamChunk) -> ReduceStep {
        if self.completed {
            return ReduceStep::Complete;
        }
        self.chunks += 1;

        if let Some(fragment) = chunk.answer() {
            self.full_answer.push_str(fragment);
        }

        if chunk.is_completion() {
            self.result = AggregatedResult::from_fields(chunk.into_fields());
            self.result.set_answer(&self.full_answer);
            self.completed = true;
            return ReduceStep::Complete;
        }

        let mut fields = chunk.into_fields();
        fields.remove(ANSWER);
        self.result.merge(fields);
        if !self.full_answer.is_empty() {
            self.result.set_answer(&self.full_answer);
        }
        ReduceStep::Continue
    }

    /// Text accumulated so far.
    pub fn answer(&self) -> &str {
        &self.full_answer
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Number of malformed chunks skipped so far.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    /// Finalizes the result after completion or EOF.
    pub fn finish(self) -> AggregatedResult {
        let Self {
            full_answer,
            mut result,
            completed,
            chunks,
            malformed,
        } = self;

        if !full_answer.is_empty() && !result.contains(ANSWER) {
            result.set_answer(&full_answer);
        }

        if result.is_empty() {
            result = AggregatedResult::fallback(&full_answer);
        }

        tracing::info!(
            chunks,
            malformed,
            completed,
            answer_len = result.answer().map(str::len).unwrap_or(0),
            "Stream reduced"
        );
        result
    }

    /// Abandons the stream after a transport failure.
    pub fn fail(self, message: impl Into<String>) -> AggregatedResult {
        let message = message.into();
        tracing::error!(
            error = %message,
            received_len = self.full_answer.len(),
            "Stream transport failed"
        );
        AggregatedResult::stream_failure(message).with_partial_answer(&self.full_answer)
    }
}

/// Reduces an in-memory sequence of lines.
pub fn reduce_lines<I, S>(lines: I) -> AggregatedResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut reducer = StreamReducer::new();
    for line in lines {
        if reducer.push_line(line.as_ref()) == ReduceStep::Complete {
            break;
        }
    }
    reducer.finish()
}

/// Reduces a live line stream.
///
/// Stops reading as soon as a completion chunk arrives. A transport error
/// never escapes: it becomes [`AggregatedResult::stream_failure`].
pub async fn reduce_stream<S, E>(lines: S) -> AggregatedResult
where
    S: Stream<Item = Result<String, E>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(lines);
    let mut reducer = StreamReducer::new();

    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => {
                if reducer.push_line(&line) == ReduceStep::Complete {
                    break;
                }
            }
            Err(e) => return reducer.fail(e.to_string()),
        }
    }

    reducer.finish()
}
