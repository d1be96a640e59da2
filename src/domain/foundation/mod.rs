//! Foundation module - Shared domain primitives.
//!
//! Value objects, identifiers and error types used across the relay.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::ConversationId;
pub use timestamp::Timestamp;
