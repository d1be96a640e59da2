//! Chat relay handlers.
//!
//! Commands and queries behind the `/api/chat` routes. Every handler
//! resolves credentials first, so missing configuration is reported before
//! any upstream call.

mod agent_chat;
mod conversation_history;
mod create_conversation;
mod credentials;
mod error;
mod forget_conversation;
mod list_conversations;
mod quick_chat;
mod send_message;
mod stream_chat;

#[cfg(test)]
mod test_support;

pub use agent_chat::{AgentChatCommand, AgentChatHandler, AgentChatResult, ConversationState};
pub use conversation_history::{GetConversationHistoryHandler, GetConversationHistoryQuery};
pub use create_conversation::{
    CreateConversationCommand, CreateConversationHandler, CreateConversationResult,
};
pub use credentials::{CredentialOverrides, CredentialResolver};
pub use error::RelayError;
pub use forget_conversation::{ForgetConversationCommand, ForgetConversationHandler};
pub use list_conversations::{ListConversationsHandler, ListConversationsQuery, DEFAULT_LIST_LIMIT};
pub use quick_chat::{QuickChatCommand, QuickChatHandler, QuickChatResult};
pub use send_message::{SendMessageCommand, SendMessageHandler, SendMessageResult};
pub use stream_chat::{
    StreamChatCommand, StreamChatHandler, StreamChatSession, StreamEvent, StreamEvents,
    StreamSummary,
};
