//! Mock Conversation Provider for testing.
//!
//! Scripted stand-in for the upstream API so handlers and routes can be
//! exercised without network access.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockConversationProvider::new()
//!     .with_conversation("conv-1")
//!     .with_stream_lines(["data: {\"answer\":\"Hi\",\"is_completion\":true}"]);
//! ```

use async_trait::async_trait;
use futures::stream;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::foundation::ConversationId;
use crate::ports::{
    ConversationProvider, CreatedConversation, MessageReply, ProviderCredentials,
    SendMessageRequest, UpstreamError,
};

/// A scripted reply to `send_message`.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Synchronous JSON body.
    Direct(Value),
    /// Streamed lines, yielded in order.
    Stream(Vec<Result<String, UpstreamError>>),
    /// Fail before any body is read.
    Error(UpstreamError),
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateConversation {
        app_id: String,
        authorization: String,
    },
    SendMessage {
        app_id: String,
        authorization: String,
        request: SendMessageRequest,
    },
    ConversationHistory {
        app_id: String,
        conversation_id: ConversationId,
    },
}

/// Mock provider with queued results and call tracking.
#[derive(Debug, Clone, Default)]
pub struct MockConversationProvider {
    creates: Arc<Mutex<VecDeque<Result<CreatedConversation, UpstreamError>>>>,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    history: Arc<Mutex<Option<Result<Value, UpstreamError>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockConversationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful create-conversation result.
    pub fn with_conversation(self, conversation_id: &str) -> Self {
        let request_id = Some(format!("req-{}", conversation_id));
        let created = ConversationId::new(conversation_id)
            .map(|id| CreatedConversation {
                conversation_id: id,
                request_id,
            })
            .map_err(|_| UpstreamError::MissingConversationId);
        lock(&self.creates).push_back(created);
        self
    }

    /// Queues a failing create-conversation result.
    pub fn with_create_error(self, error: UpstreamError) -> Self {
        lock(&self.creates).push_back(Err(error));
        self
    }

    /// Queues a synchronous reply body.
    pub fn with_direct_reply(self, body: Value) -> Self {
        lock(&self.replies).push_back(MockReply::Direct(body));
        self
    }

    /// Queues a streamed reply made of the given lines.
    pub fn with_stream_lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(|l| Ok(l.into())).collect();
        lock(&self.replies).push_back(MockReply::Stream(lines));
        self
    }

    /// Queues an arbitrary scripted reply.
    pub fn with_reply(self, reply: MockReply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Queues a failing send-message result.
    pub fn with_send_error(self, error: UpstreamError) -> Self {
        self.with_reply(MockReply::Error(error))
    }

    /// Sets the history result.
    pub fn with_history(self, result: Result<Value, UpstreamError>) -> Self {
        *lock(&self.history) = Some(result);
        self
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::CreateConversation { .. }))
            .count()
    }

    pub fn send_calls(&self) -> Vec<SendMessageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::SendMessage { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ConversationProvider for MockConversationProvider {
    async fn create_conversation(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CreatedConversation, UpstreamError> {
        self.record(MockCall::CreateConversation {
            app_id: credentials.app_id().to_string(),
            authorization: credentials.authorization_header(),
        });

        let next = lock(&self.creates).pop_front();
        match next {
            Some(result) => result,
            None => {
                let n = self.create_calls();
                Ok(CreatedConversation {
                    conversation_id: ConversationId::new(format!("mock-conv-{}", n))
                        .map_err(|_| UpstreamError::MissingConversationId)?,
                    request_id: None,
                })
            }
        }
    }

    async fn send_message(
        &self,
        credentials: &ProviderCredentials,
        request: SendMessageRequest,
    ) -> Result<MessageReply, UpstreamError> {
        self.record(MockCall::SendMessage {
            app_id: credentials.app_id().to_string(),
            authorization: credentials.authorization_header(),
            request,
        });

        let next = lock(&self.replies).pop_front();
        match next.unwrap_or_else(|| MockReply::Direct(json!({"answer": "mock reply"}))) {
            MockReply::Direct(body) => Ok(MessageReply::Direct(body)),
            MockReply::Stream(lines) => Ok(MessageReply::Streamed(Box::pin(stream::iter(lines)))),
            MockReply::Error(error) => Err(error),
        }
    }

    async fn conversation_history(
        &self,
        credentials: &ProviderCredentials,
        conversation_id: &ConversationId,
    ) -> Result<Value, UpstreamError> {
        self.record(MockCall::ConversationHistory {
            app_id: credentials.app_id().to_string(),
            conversation_id: conversation_id.clone(),
        });

        lock(&self.history)
            .clone()
            .unwrap_or_else(|| Ok(json!({"data": []})))
    }
}
