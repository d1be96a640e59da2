//! Relay module - provider reply handling.
//!
//! - `sse` - byte chunks to lines, line classification
//! - `aggregate` - `StreamChunk` and `AggregatedResult`
//! - `stream_reducer` - folds a chunk stream into one result
//! - `response_extractor` - display text from a result

mod aggregate;
mod response_extractor;
pub mod sse;
mod stream_reducer;

pub use aggregate::{
    AggregatedResult, ChunkDecodeError, StreamChunk, NO_VALID_RESPONSE, STREAM_PROCESSING_FAILED,
};
pub use response_extractor::{
    extract_response_text, AnswerField, ExtractionError, ExtractionStrategy, ResponseExtractor,
    ResultText, TextContentOutputs, NOT_UNDERSTOOD, PROCESSING_ERROR,
};
pub use stream_reducer::{reduce_lines, reduce_stream, ReduceStep, StreamReducer};
