//! Shared fixtures for handler tests.

use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;

use super::credentials::{CredentialOverrides, CredentialResolver};
use crate::adapters::cache::InMemoryConversationCache;
use crate::domain::relay::ResponseExtractor;

pub(crate) fn cache() -> Arc<InMemoryConversationCache> {
    Arc::new(InMemoryConversationCache::new(
        Duration::from_secs(7 * 24 * 3600),
        Duration::from_secs(3600),
    ))
}

pub(crate) fn resolver() -> Arc<CredentialResolver> {
    Arc::new(CredentialResolver::new(
        Some(Secret::new("cfg-token".to_string())),
        Some("cfg-app".to_string()),
    ))
}

pub(crate) fn extractor() -> Arc<ResponseExtractor> {
    Arc::new(ResponseExtractor::default())
}

pub(crate) fn overrides(token: Option<&str>, app_id: Option<&str>) -> CredentialOverrides {
    CredentialOverrides::new(token.map(str::to_string), app_id.map(str::to_string))
}
