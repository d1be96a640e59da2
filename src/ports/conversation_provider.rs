//! Conversation Provider Port - Interface to the upstream conversational-AI app.
//!
//! The relay talks to exactly one kind of provider: an "app builder" API that
//! hosts conversations server-side. This port covers the three calls the relay
//! needs (create, run, history) and hides the HTTP details behind
//! [`UpstreamError`].
//!
//! # Example
//!
//! ```ignore
//! let created = provider.create_conversation(&credentials).await?;
//! let reply = provider
//!     .send_message(&credentials, SendMessageRequest::new(created.conversation_id, "hi"))
//!     .await?;
//! ```

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;

use crate::domain::foundation::ConversationId;

/// Raw text lines of a streamed reply.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// Port for the upstream conversation API.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    /// Opens a new conversation for the given app.
    async fn create_conversation(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CreatedConversation, UpstreamError>;

    /// Sends one user message into an existing conversation.
    ///
    /// With `stream` set the reply body is handed back as lines; the caller
    /// reduces them.
    async fn send_message(
        &self,
        credentials: &ProviderCredentials,
        request: SendMessageRequest,
    ) -> Result<MessageReply, UpstreamError>;

    /// Fetches the provider's message history for a conversation.
    async fn conversation_history(
        &self,
        credentials: &ProviderCredentials,
        conversation_id: &ConversationId,
    ) -> Result<Value, UpstreamError>;
}

/// Credential and app id used for one upstream call.
#[derive(Clone)]
pub struct ProviderCredentials {
    token: Secret<String>,
    app_id: String,
}

impl ProviderCredentials {
    pub fn new(token: Secret<String>, app_id: impl Into<String>) -> Self {
        Self {
            token,
            app_id: app_id.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn token(&self) -> &Secret<String> {
        &self.token
    }

    /// `Authorization` header value. A token that already carries the
    /// `Bearer ` scheme is used as-is.
    pub fn authorization_header(&self) -> String {
        let token = self.token.expose_secret();
        if token.starts_with("Bearer ") {
            token.clone()
        } else {
            format!("Bearer {}", token)
        }
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("token", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Reply of the create-conversation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedConversation {
    pub conversation_id: ConversationId,
    pub request_id: Option<String>,
}

/// One user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub conversation_id: ConversationId,
    pub query: String,
    pub stream: bool,
}

impl SendMessageRequest {
    /// Non-streaming request.
    pub fn new(conversation_id: ConversationId, query: impl Into<String>) -> Self {
        Self {
            conversation_id,
            query: query.into(),
            stream: false,
        }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Reply of the send-message call.
pub enum MessageReply {
    /// Complete JSON reply of a non-streaming call, whatever its shape.
    Direct(Value),
    /// Line stream of a streaming call, not yet reduced.
    Streamed(LineStream),
}

impl std::fmt::Debug for MessageReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(body) => f.debug_tuple("Direct").field(body).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

/// Upstream failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Request did not finish within its timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Connection level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Provider rejected the credential.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Any other non-success status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Create-conversation succeeded but carried no id.
    #[error("provider response did not contain a conversation id")]
    MissingConversationId,

    /// Stream broke after it had started.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl UpstreamError {
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
