//! ListConversationsHandler - Conversations known to this relay instance.

use std::sync::Arc;

use crate::ports::{CachedConversation, ConversationCache};

/// Default page size of the listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct ListConversationsQuery {
    pub limit: usize,
}

impl Default for ListConversationsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

pub struct ListConversationsHandler {
    cache: Arc<dyn ConversationCache>,
}

impl ListConversationsHandler {
    pub fn new(cache: Arc<dyn ConversationCache>) -> Self {
        Self { cache }
    }

    /// Most recently used first.
    pub async fn handle(&self, query: ListConversationsQuery) -> Vec<CachedConversation> {
        self.cache.list(query.limit).await
    }
}
