//! CreateConversationHandler - Open a provider conversation and record it.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::credentials::{CredentialOverrides, CredentialResolver};
use super::error::RelayError;
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationCache, ConversationProvider, ProviderCredentials};

/// Command to create a conversation
#[derive(Debug, Clone, Default)]
pub struct CreateConversationCommand {
    pub overrides: CredentialOverrides,
}

/// Result of creating a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateConversationResult {
    pub conversation_id: ConversationId,
    pub request_id: Option<String>,
    pub app_id: String,
}

/// Handler for creating conversations
pub struct CreateConversationHandler<P: ?Sized + ConversationProvider> {
    provider: Arc<P>,
    cache: Arc<dyn ConversationCache>,
    credentials: Arc<CredentialResolver>,
}

impl<P: ?Sized + ConversationProvider> CreateConversationHandler<P> {
    pub fn new(
        provider: Arc<P>,
        cache: Arc<dyn ConversationCache>,
        credentials: Arc<CredentialResolver>,
    ) -> Self {
        Self {
            provider,
            cache,
            credentials,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateConversationCommand,
    ) -> Result<CreateConversationResult, RelayError> {
        let credentials = self.credentials.resolve(&cmd.overrides)?;
        self.create_with(&credentials).await
    }

    /// Creates a conversation with already-resolved credentials.
    pub(crate) async fn create_with(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CreateConversationResult, RelayError> {
        let created = self
            .provider
            .create_conversation(credentials)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, app_id = credentials.app_id(), "Failed to create conversation");
                RelayError::from(e)
            })?;

        let mut metadata = Map::new();
        if let Some(request_id) = &created.request_id {
            metadata.insert("request_id".to_string(), Value::String(request_id.clone()));
        }
        self.cache
            .store(
                created.conversation_id.clone(),
                credentials.app_id().to_string(),
                metadata,
            )
            .await;

        Ok(CreateConversationResult {
            conversation_id: created.conversation_id,
            request_id: created.request_id,
            app_id: credentials.app_id().to_string(),
        })
    }
}
