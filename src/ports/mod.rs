//! Ports - interfaces between the relay core and the outside world.
//!
//! - `ConversationProvider` - the upstream conversational-AI API
//! - `ConversationCache` - ephemeral registry of known conversations

mod conversation_cache;
mod conversation_provider;

pub use conversation_cache::{CachedConversation, ConversationCache};
pub use conversation_provider::{
    ConversationProvider, CreatedConversation, LineStream, MessageReply, ProviderCredentials,
    SendMessageRequest, UpstreamError,
};
