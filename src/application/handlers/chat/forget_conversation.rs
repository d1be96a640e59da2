//! ForgetConversationHandler - Drop a conversation from this relay's cache.
//!
//! The provider keeps the conversation; only the local registry entry goes.

use std::sync::Arc;

use crate::domain::foundation::ConversationId;
use crate::ports::ConversationCache;

#[derive(Debug, Clone)]
pub struct ForgetConversationCommand {
    pub conversation_id: ConversationId,
}

pub struct ForgetConversationHandler {
    cache: Arc<dyn ConversationCache>,
}

impl ForgetConversationHandler {
    pub fn new(cache: Arc<dyn ConversationCache>) -> Self {
        Self { cache }
    }

    /// Returns false when the conversation was not cached.
    pub async fn handle(&self, cmd: ForgetConversationCommand) -> bool {
        let removed = self.cache.delete(&cmd.conversation_id).await;
        tracing::info!(conversation_id = %cmd.conversation_id, removed, "Forgot conversation");
        removed
    }
}
