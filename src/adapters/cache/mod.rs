//! Conversation cache adapters.

mod in_memory_conversation_cache;

pub use in_memory_conversation_cache::InMemoryConversationCache;
