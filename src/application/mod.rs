//! Application layer - Commands, Queries, and Handlers.
//!
//! Orchestrates the relay's domain logic and coordinates between ports.

pub mod handlers;

pub use handlers::chat::{
    AgentChatCommand, AgentChatHandler, AgentChatResult, CredentialOverrides, CredentialResolver,
    RelayError,
};
