//! AgentChatHandler - Two-step chat: create a conversation if needed, then send.
//!
//! Each request runs a tiny state machine:
//!
//! ```text
//! NeedConversation --create--> HaveConversation --send--> done
//! ```
//!
//! A request that already carries a conversation id starts in
//! `HaveConversation` and never calls create.

use std::sync::Arc;

use super::create_conversation::CreateConversationHandler;
use super::credentials::{CredentialOverrides, CredentialResolver};
use super::error::{require_message, RelayError};
use super::send_message::SendMessageHandler;
use crate::domain::foundation::ConversationId;
use crate::domain::relay::ResponseExtractor;
use crate::ports::{ConversationCache, ConversationProvider};

/// Command for a combined chat turn
#[derive(Debug, Clone, Default)]
pub struct AgentChatCommand {
    pub message: String,
    /// Existing conversation; blank or absent starts a new one
    pub conversation_id: Option<String>,
    pub stream: bool,
    pub overrides: CredentialOverrides,
}

/// Result of a combined chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct AgentChatResult {
    pub conversation_id: ConversationId,
    pub response_text: String,
    pub request_id: Option<String>,
    pub message_id: Option<String>,
    /// True when this turn opened the conversation
    pub created: bool,
}

/// Per-request conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    NeedConversation,
    HaveConversation(ConversationId),
}

impl ConversationState {
    /// Initial state for a request's optional conversation id.
    pub fn from_request(conversation_id: Option<&str>) -> Result<Self, RelayError> {
        match conversation_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(Self::HaveConversation(ConversationId::new(id)?)),
            None => Ok(Self::NeedConversation),
        }
    }
}

/// Handler for combined chat turns
pub struct AgentChatHandler<P: ?Sized + ConversationProvider> {
    credentials: Arc<CredentialResolver>,
    create: CreateConversationHandler<P>,
    send: SendMessageHandler<P>,
}

impl<P: ?Sized + ConversationProvider> AgentChatHandler<P> {
    pub fn new(
        provider: Arc<P>,
        cache: Arc<dyn ConversationCache>,
        credentials: Arc<CredentialResolver>,
        extractor: Arc<ResponseExtractor>,
    ) -> Self {
        Self {
            create: CreateConversationHandler::new(provider.clone(), cache.clone(), credentials.clone()),
            send: SendMessageHandler::new(provider, cache, credentials.clone(), extractor),
            credentials,
        }
    }

    pub async fn handle(&self, cmd: AgentChatCommand) -> Result<AgentChatResult, RelayError> {
        require_message(&cmd.message)?;
        let credentials = self.credentials.resolve(&cmd.overrides)?;

        let (conversation_id, created) =
            match ConversationState::from_request(cmd.conversation_id.as_deref())? {
                ConversationState::NeedConversation => {
                    tracing::info!("Creating conversation for chat turn");
                    let created = self.create.create_with(&credentials).await?;
                    (created.conversation_id, true)
                }
                ConversationState::HaveConversation(id) => {
                    tracing::info!(conversation_id = %id, "Using existing conversation");
                    (id, false)
                }
            };

        let reply = self
            .send
            .send_with(&credentials, conversation_id, cmd.message, cmd.stream)
            .await?;

        Ok(AgentChatResult {
            conversation_id: reply.conversation_id,
            response_text: reply.response_text,
            request_id: reply.request_id,
            message_id: reply.message_id,
            created,
        })
    }
}
