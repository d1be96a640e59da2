//! HTTP adapter for the chat relay.
//!
//! - `dto` - request and response bodies
//! - `handlers` - axum handlers and the error envelope
//! - `routes` - routing table

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ChatApiError, ChatAppState};
pub use routes::{chat_router, chat_routes, health_routes};
