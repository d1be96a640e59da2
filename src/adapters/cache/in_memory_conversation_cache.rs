//! In-memory conversation cache.
//!
//! Single-process only; contents are lost on restart.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{CachedConversation, ConversationCache};

/// `ConversationCache` backed by a `HashMap`.
#[derive(Debug, Clone)]
pub struct InMemoryConversationCache {
    state: Arc<RwLock<CacheState>>,
    max_age: Duration,
    cleanup_interval: Duration,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<ConversationId, CachedConversation>,
    last_cleanup: Timestamp,
}

impl CacheState {
    /// Removes entries not used since `cutoff`.
    fn remove_older_than(&mut self, cutoff: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.last_used.is_before(&cutoff));
        before - self.entries.len()
    }
}

impl InMemoryConversationCache {
    pub fn new(max_age: Duration, cleanup_interval: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState {
                entries: HashMap::new(),
                last_cleanup: Timestamp::now(),
            })),
            max_age,
            cleanup_interval,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_age(), config.cleanup_interval())
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Moves an entry's `last_used` into the past.
    #[cfg(test)]
    async fn backdate(&self, conversation_id: &ConversationId, by: Duration) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.entries.get_mut(conversation_id) {
            entry.last_used = entry.last_used.minus(by);
        }
    }

    #[cfg(test)]
    async fn backdate_last_cleanup(&self, by: Duration) {
        let mut state = self.state.write().await;
        state.last_cleanup = state.last_cleanup.minus(by);
    }
}

#[async_trait]
impl ConversationCache for InMemoryConversationCache {
    async fn store(&self, conversation_id: ConversationId, app_id: String, metadata: Map<String, Value>) {
        let now = Timestamp::now();
        let mut state = self.state.write().await;

        state.entries.insert(
            conversation_id.clone(),
            CachedConversation {
                conversation_id,
                app_id,
                created_at: now,
                last_used: now,
                metadata,
            },
        );

        // Lazy sweep, at most once per cleanup interval
        if !state.last_cleanup.is_before(&now.minus(self.cleanup_interval)) {
            return;
        }
        state.last_cleanup = now;
        let removed = state.remove_older_than(now.minus(self.max_age));
        if removed > 0 {
            tracing::info!(removed, "Evicted expired conversations");
        }
    }

    async fn get(&self, conversation_id: &ConversationId) -> Option<CachedConversation> {
        let mut state = self.state.write().await;
        let entry = state.entries.get_mut(conversation_id)?;
        entry.last_used = Timestamp::now();
        Some(entry.clone())
    }

    async fn update_metadata(&self, conversation_id: &ConversationId, metadata: Map<String, Value>) -> bool {
        let mut state = self.state.write().await;
        let Some(entry) = state.entries.get_mut(conversation_id) else {
            return false;
        };
        entry.metadata.extend(metadata);
        entry.last_used = Timestamp::now();
        true
    }

    async fn delete(&self, conversation_id: &ConversationId) -> bool {
        self.state.write().await.entries.remove(conversation_id).is_some()
    }

    async fn list(&self, limit: usize) -> Vec<CachedConversation> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        entries.truncate(limit);
        entries
    }

    async fn evict_expired(&self) -> usize {
        let now = Timestamp::now();
        let mut state = self.state.write().await;
        state.last_cleanup = now;
        let removed = state.remove_older_than(now.minus(self.max_age));
        if removed > 0 {
            tracing::info!(removed, "Evicted expired conversations");
        }
        removed
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}
