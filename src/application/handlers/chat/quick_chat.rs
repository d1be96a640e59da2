//! QuickChatHandler - Always open a fresh conversation, then send.

use std::sync::Arc;

use super::create_conversation::{CreateConversationHandler, CreateConversationResult};
use super::credentials::{CredentialOverrides, CredentialResolver};
use super::error::{require_message, RelayError};
use super::send_message::{SendMessageHandler, SendMessageResult};
use crate::domain::relay::ResponseExtractor;
use crate::ports::{ConversationCache, ConversationProvider};

#[derive(Debug, Clone, Default)]
pub struct QuickChatCommand {
    pub message: String,
    pub stream: bool,
    pub overrides: CredentialOverrides,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickChatResult {
    pub conversation: CreateConversationResult,
    pub message: SendMessageResult,
}

pub struct QuickChatHandler<P: ?Sized + ConversationProvider> {
    credentials: Arc<CredentialResolver>,
    create: CreateConversationHandler<P>,
    send: SendMessageHandler<P>,
}

impl<P: ?Sized + ConversationProvider> QuickChatHandler<P> {
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

    pub async fn handle(&self, cmd: QuickChatCommand) -> Result<QuickChatResult, RelayError> {
        require_message(&cmd.message)?;
        let credentials = self.credentials.resolve(&cmd.overrides)?;

        let conversation = self.create.create_with(&credentials).await?;
        let message = self
            .send
            .send_with(
                &credentials,
                conversation.conversation_id.clone(),
                cmd.message,
                cmd.stream,
            )
            .await?;

        Ok(QuickChatResult {
            conversation,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockConversationProvider;
    use crate::application::handlers::chat::test_support::{cache, extractor, resolver};

    #[tokio::test]
    async fn always_creates_a_conversation() {
        let provider = Arc::new(
            MockConversationProvider::new()
                .with_conversation("q1")
                .with_stream_lines([r#"data: {"answer":"ok","is_completion":true}"#]),
        );
        let handler = QuickChatHandler::new(provider.clone(), cache(), resolver(), extractor());

        let result = handler
            .handle(QuickChatCommand {
                message: "hi".into(),
                stream: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.conversation.conversation_id.as_str(), "q1");
        assert_eq!(result.message.conversation_id.as_str(), "q1");
        assert_eq!(result.message.response_text, "ok");
        assert_eq!(provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let provider = Arc::new(MockConversationProvider::new());
        let handler = QuickChatHandler::new(provider.clone(), cache(), resolver(), extractor());

        let err = handler.handle(QuickChatCommand::default()).await.unwrap_err();

        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(provider.call_count(), 0);
    }
}
