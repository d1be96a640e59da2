//! Conversation Cache Port - registry of conversations seen by this relay.
//!
//! The cache is ephemeral and advisory: losing it never breaks a chat, it only
//! empties the conversations listing. Entries older than the configured
//! maximum age are evicted.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::foundation::{ConversationId, Timestamp};

/// One cached conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedConversation {
    pub conversation_id: ConversationId,
    pub app_id: String,
    pub created_at: Timestamp,
    pub last_used: Timestamp,
    pub metadata: Map<String, Value>,
}

/// Port for the conversation registry.
#[async_trait]
pub trait ConversationCache: Send + Sync {
    /// Records a conversation, replacing any previous entry with the same id.
    async fn store(&self, conversation_id: ConversationId, app_id: String, metadata: Map<String, Value>);

    /// Looks up a conversation and refreshes its `last_used`.
    async fn get(&self, conversation_id: &ConversationId) -> Option<CachedConversation>;

    /// Shallow-merges `metadata` into an entry. Returns false if absent.
    async fn update_metadata(&self, conversation_id: &ConversationId, metadata: Map<String, Value>) -> bool;

    /// Removes an entry. Returns false if absent.
    async fn delete(&self, conversation_id: &ConversationId) -> bool;

    /// Most recently used first, at most `limit` entries.
    async fn list(&self, limit: usize) -> Vec<CachedConversation>;

    /// Removes entries older than the maximum age; returns how many.
    async fn evict_expired(&self) -> usize;

    /// Number of cached entries.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
