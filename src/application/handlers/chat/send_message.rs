//! SendMessageHandler - Send one message into an existing conversation.
//!
//! Streamed replies are reduced into one result; either way the reply text is
//! picked by the response extractor.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::credentials::{CredentialOverrides, CredentialResolver};
use super::error::{require_message, RelayError};
use crate::domain::foundation::ConversationId;
use crate::domain::relay::{reduce_stream, ResponseExtractor};
use crate::ports::{
    ConversationCache, ConversationProvider, MessageReply, ProviderCredentials,
    SendMessageRequest, UpstreamError,
};

/// Command to send a message
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    pub message: String,
    pub stream: bool,
    pub overrides: CredentialOverrides,
}

/// Result of sending a message
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessageResult {
    pub conversation_id: ConversationId,
    pub response_text: String,
    pub request_id: Option<String>,
    pub message_id: Option<String>,
    /// Provider result as received (aggregated for streamed calls)
    pub raw: Value,
}

/// Handler for sending messages
pub struct SendMessageHandler<P: ?Sized + ConversationProvider> {
    provider: Arc<P>,
    cache: Arc<dyn ConversationCache>,
    credentials: Arc<CredentialResolver>,
    extractor: Arc<ResponseExtractor>,
}

impl<P: ?Sized + ConversationProvider> SendMessageHandler<P> {
    pub fn new(
        provider: Arc<P>,
        cache: Arc<dyn ConversationCache>,
        credentials: Arc<CredentialResolver>,
        extractor: Arc<ResponseExtractor>,
    ) -> Self {
        Self {
            provider,
            cache,
            credentials,
            extractor,
        }
    }

    pub async fn handle(&self, cmd: SendMessageCommand) -> Result<SendMessageResult, RelayError> {
        require_message(&cmd.message)?;
        let credentials = self.credentials.resolve(&cmd.overrides)?;
        self.send_with(&credentials, cmd.conversation_id, cmd.message, cmd.stream)
            .await
    }

    /// Sends with already-resolved credentials.
    pub(crate) async fn send_with(
        &self,
        credentials: &ProviderCredentials,
        conversation_id: ConversationId,
        message: String,
        stream: bool,
    ) -> Result<SendMessageResult, RelayError> {
        touch_conversation(self.cache.as_ref(), &conversation_id, credentials.app_id()).await;

        let request = SendMessageRequest::new(conversation_id.clone(), message).streaming(stream);
        let reply = self
            .provider
            .send_message(credentials, request)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, conversation_id = %conversation_id, "Failed to send message");
                RelayError::from(e)
            })?;

        let raw = match reply {
            MessageReply::Direct(body) => body,
            MessageReply::Streamed(lines) => {
                let result = reduce_stream(lines).await;
                if let Some(error) = result.error() {
                    tracing::error!(error = %error, conversation_id = %conversation_id, "Stream failed after start");
                    return Err(UpstreamError::StreamInterrupted(error.to_string()).into());
                }
                result.into_value()
            }
        };

        let response_text = self.extractor.extract(&raw);
        let request_id = str_field(&raw, "request_id");
        let message_id = str_field(&raw, "message_id");
        self.record_reply(&conversation_id, request_id.as_deref(), message_id.as_deref())
            .await;
        tracing::info!(
            conversation_id = %conversation_id,
            response_len = response_text.len(),
            "Message relayed"
        );

        Ok(SendMessageResult {
            conversation_id,
            response_text,
            request_id,
            message_id,
            raw,
        })
    }

    /// Remembers the latest provider ids on the cached conversation.
    async fn record_reply(
        &self,
        conversation_id: &ConversationId,
        request_id: Option<&str>,
        message_id: Option<&str>,
    ) {
        let mut metadata = Map::new();
        if let Some(id) = request_id {
            metadata.insert("last_request_id".to_string(), Value::String(id.to_string()));
        }
        if let Some(id) = message_id {
            metadata.insert("last_message_id".to_string(), Value::String(id.to_string()));
        }
        if !metadata.is_empty() {
            self.cache.update_metadata(conversation_id, metadata).await;
        }
    }
}

fn str_field(body: &Value, field: &str) -> Option<String> {
    body.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Refreshes a known conversation, or records one first seen in a request.
pub(crate) async fn touch_conversation(
    cache: &dyn ConversationCache,
    conversation_id: &ConversationId,
    app_id: &str,
) {
    if cache.get(conversation_id).await.is_none() {
        cache
            .store(conversation_id.clone(), app_id.to_string(), Map::new())
            .await;
    }
}
