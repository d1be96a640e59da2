//! Provider result objects.
//!
//! The provider's reply is an open JSON object: besides `answer` and
//! `is_completion` it carries request ids, message ids and whatever else the
//! provider decides to send. Both [`StreamChunk`] and [`AggregatedResult`]
//! keep those fields verbatim instead of projecting them onto a fixed struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder answer when a stream produced nothing usable.
pub const NO_VALID_RESPONSE: &str = "Sorry, no valid response was received.";

/// Placeholder answer when reading the stream failed part way through.
pub const STREAM_PROCESSING_FAILED: &str =
    "Sorry, an error occurred while processing the streamed response.";

pub(crate) const ANSWER: &str = "answer";
pub(crate) const IS_COMPLETION: &str = "is_completion";
pub(crate) const CONVERSATION_ID: &str = "conversation_id";
pub(crate) const REQUEST_ID: &str = "request_id";
pub(crate) const MESSAGE_ID: &str = "message_id";
pub(crate) const ERROR: &str = "error";
pub(crate) const PARTIAL_ANSWER: &str = "partial_answer";

/// A chunk payload that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkDecodeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// One decoded event unit from the streaming transport.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    fields: Map<String, Value>,
}

impl StreamChunk {
    /// Decodes a `data:` payload into a chunk. Any JSON object is accepted.
    pub fn parse(payload: &str) -> Result<Self, ChunkDecodeError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ChunkDecodeError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Wraps an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ChunkDecodeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ChunkDecodeError::NotAnObject),
        }
    }

    /// Text fragment carried by this chunk; non-string values are ignored.
    pub fn answer(&self) -> Option<&str> {
        self.fields.get(ANSWER).and_then(Value::as_str)
    }

    /// True only when `is_completion` is the boolean `true`.
    pub fn is_completion(&self) -> bool {
        self.fields
            .get(IS_COMPLETION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Borrow every field of the chunk.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the chunk, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

/// Single combined result of a provider call.
///
/// Produced by the stream reducer for streamed calls, or deserialized
/// directly from a synchronous reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedResult(Map<String, Value>);

impl AggregatedResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a provider JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Result synthesized when a stream yielded no usable chunk.
    pub fn fallback(accumulated: &str) -> Self {
        let answer = if accumulated.is_empty() {
            NO_VALID_RESPONSE
        } else {
            accumulated
        };

        let mut fields = Map::new();
        fields.insert(ANSWER.into(), Value::String(answer.to_string()));
        fields.insert(IS_COMPLETION.into(), Value::Bool(true));
        fields.insert(REQUEST_ID.into(), Value::String("stream-unknown".into()));
        fields.insert(CONVERSATION_ID.into(), Value::String("unknown".into()));
        fields.insert(MESSAGE_ID.into(), Value::String("unknown".into()));
        Self(fields)
    }

    /// Result returned when the transport failed mid-stream.
    pub fn stream_failure(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(ANSWER.into(), Value::String(STREAM_PROCESSING_FAILED.into()));
        fields.insert(IS_COMPLETION.into(), Value::Bool(true));
        fields.insert(ERROR.into(), Value::String(message.into()));
        Self(fields)
    }

    /// Keeps text received before a failure under `partial_answer`.
    pub fn with_partial_answer(mut self, partial: &str) -> Self {
        if !partial.is_empty() {
            self.0
                .insert(PARTIAL_ANSWER.into(), Value::String(partial.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn answer(&self) -> Option<&str> {
        self.str_field(ANSWER)
    }

    pub fn is_completion(&self) -> bool {
        self.0
            .get(IS_COMPLETION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.str_field(CONVERSATION_ID)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.str_field(REQUEST_ID)
    }

    pub fn message_id(&self) -> Option<&str> {
        self.str_field(MESSAGE_ID)
    }

    /// Transport error recorded by [`AggregatedResult::stream_failure`].
    pub fn error(&self) -> Option<&str> {
        self.str_field(ERROR)
    }

    /// Text received before a transport failure.
    pub fn partial_answer(&self) -> Option<&str> {
        self.str_field(PARTIAL_ANSWER)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub(crate) fn set_answer(&mut self, answer: &str) {
        self.0.insert(ANSWER.into(), Value::String(answer.to_string()));
    }

    /// Shallow merge: every field of `fields` overwrites the same-named field.
    pub(crate) fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.0.insert(key, value);
        }
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}
