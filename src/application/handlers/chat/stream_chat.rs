//! StreamChatHandler - Relay a streamed reply chunk by chunk.
//!
//! Each decodable provider chunk is forwarded as [`StreamEvent::Chunk`] while
//! the same chunks feed a [`StreamReducer`]. The stream always ends with one
//! [`StreamEvent::Done`] carrying the aggregated result, so clients that only
//! want the final text can ignore the chunks.

use futures::stream::{self, Stream, StreamExt};
use serde_json::{Map, Value};
use std::pin::Pin;
use std::sync::Arc;

use super::create_conversation::CreateConversationHandler;
use super::credentials::{CredentialOverrides, CredentialResolver};
use super::agent_chat::ConversationState;
use super::error::{require_message, RelayError};
use super::send_message::touch_conversation;
use crate::domain::foundation::ConversationId;
use crate::domain::relay::sse::{classify_line, SseLine};
use crate::domain::relay::{AggregatedResult, ResponseExtractor, StreamChunk, StreamReducer};
use crate::ports::{
    ConversationCache, ConversationProvider, LineStream, MessageReply, SendMessageRequest,
};

#[derive(Debug, Clone, Default)]
pub struct StreamChatCommand {
    pub message: String,
    pub conversation_id: Option<String>,
    pub overrides: CredentialOverrides,
}

/// Final event of a relayed stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub conversation_id: ConversationId,
    pub response_text: String,
    pub result: AggregatedResult,
}

impl StreamSummary {
    /// True when the transport broke mid-stream.
    pub fn is_failure(&self) -> bool {
        self.result.error().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One provider chunk, verbatim.
    Chunk(Map<String, Value>),
    /// Aggregated result; always the last event.
    Done(StreamSummary),
}

pub type StreamEvents = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// An open relayed stream.
pub struct StreamChatSession {
    pub conversation_id: ConversationId,
    pub created: bool,
    pub events: StreamEvents,
}

impl std::fmt::Debug for StreamChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChatSession")
            .field("conversation_id", &self.conversation_id)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

pub struct StreamChatHandler<P: ?Sized + ConversationProvider> {
    provider: Arc<P>,
    cache: Arc<dyn ConversationCache>,
    credentials: Arc<CredentialResolver>,
    extractor: Arc<ResponseExtractor>,
    create: CreateConversationHandler<P>,
}

impl<P: ?Sized + ConversationProvider> StreamChatHandler<P> {
    pub fn new(
        provider: Arc<P>,
        cache: Arc<dyn ConversationCache>,
        credentials: Arc<CredentialResolver>,
        extractor: Arc<ResponseExtractor>,
    ) -> Self {
        Self {
            create: CreateConversationHandler::new(provider.clone(), cache.clone(), credentials.clone()),
            provider,
            cache,
            credentials,
            extractor,
        }
    }

    /// Opens the upstream stream. Errors before the first byte are returned
    /// here; later failures end the event stream with a failed summary.
    pub async fn handle(&self, cmd: StreamChatCommand) -> Result<StreamChatSession, RelayError> {
        require_message(&cmd.message)?;
        let credentials = self.credentials.resolve(&cmd.overrides)?;

        let (conversation_id, created) =
            match ConversationState::from_request(cmd.conversation_id.as_deref())? {
                ConversationState::NeedConversation => {
                    (self.create.create_with(&credentials).await?.conversation_id, true)
                }
                ConversationState::HaveConversation(id) => {
                    touch_conversation(self.cache.as_ref(), &id, credentials.app_id()).await;
                    (id, false)
                }
            };

        let request = SendMessageRequest::new(conversation_id.clone(), cmd.message).streaming(true);
        let reply = self
            .provider
            .send_message(&credentials, request)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, conversation_id = %conversation_id, "Failed to open stream");
                RelayError::from(e)
            })?;

        let events: StreamEvents = match reply {
            MessageReply::Direct(body) => {
                let response_text = self.extractor.extract(&body);
                let result = match body {
                    Value::Object(fields) => AggregatedResult::from_fields(fields),
                    _ => AggregatedResult::new(),
                };
                let summary = StreamSummary {
                    conversation_id: conversation_id.clone(),
                    response_text,
                    result,
                };
                Box::pin(stream::once(async move { StreamEvent::Done(summary) }))
            }
            MessageReply::Streamed(lines) => relay_events(lines, conversation_id.clone(), self.extractor.clone()),
        };

        Ok(StreamChatSession {
            conversation_id,
            created,
            events,
        })
    }
}

struct RelayState {
    lines: LineStream,
    reducer: Option<StreamReducer>,
    conversation_id: ConversationId,
    extractor: Arc<ResponseExtractor>,
}

impl RelayState {
    fn done(&mut self, result: AggregatedResult) -> StreamEvent {
        StreamEvent::Done(StreamSummary {
            conversation_id: self.conversation_id.clone(),
            response_text: self.extractor.extract_result(&result),
            result,
        })
    }

    fn finish(&mut self) -> StreamEvent {
        let result = self
            .reducer
            .take()
            .map(StreamReducer::finish)
            .unwrap_or_default();
        self.done(result)
    }

    fn fail(&mut self, message: String) -> StreamEvent {
        let result = match self.reducer.take() {
            Some(reducer) => reducer.fail(message),
            None => AggregatedResult::stream_failure(message),
        };
        self.done(result)
    }
}

fn relay_events(
    lines: LineStream,
    conversation_id: ConversationId,
    extractor: Arc<ResponseExtractor>,
) -> StreamEvents {
    let state = RelayState {
        lines,
        reducer: Some(StreamReducer::new()),
        conversation_id,
        extractor,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            let reducer = state.reducer.as_mut()?;
            if reducer.is_complete() {
                let done = state.finish();
                return Some((done, state));
            }

            match state.lines.next().await {
                Some(Ok(line)) => {
                    let SseLine::Data(payload) = classify_line(&line) else {
                        continue;
                    };
                    match StreamChunk::parse(payload) {
                        Ok(chunk) => {
                            let fields = chunk.fields().clone();
                            reducer.push_chunk(chunk);
                            return Some((StreamEvent::Chunk(fields), state));
                        }
                        Err(e) => reducer.skip_malformed(payload, &e),
                    }
                }
                Some(Err(e)) => {
                    let done = state.fail(e.to_string());
                    return Some((done, state));
                }
                None => {
                    let done = state.finish();
                    return Some((done, state));
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockConversationProvider, MockReply};
    use crate::application::handlers::chat::test_support::{cache, extractor, resolver};
    use crate::ports::UpstreamError;
    use serde_json::json;

    fn handler(provider: &Arc<MockConversationProvider>) -> StreamChatHandler<MockConversationProvider> {
        StreamChatHandler::new(provider.clone(), cache(), resolver(), extractor())
    }

    fn command(conversation_id: Option<&str>) -> StreamChatCommand {
        StreamChatCommand {
            message: "hi".into(),
            conversation_id: conversation_id.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn forwards_chunks_then_done() {
        let provider = Arc::new(MockConversationProvider::new().with_stream_lines([
            ": ping",
            r#"data: {"answer":"A","request_id":"r1"}"#,
            "data: garbage",
            r#"data: {"answer":"B","is_completion":true}"#,
            r#"data: {"answer":"ignored"}"#,
        ]));

        let session = handler(&provider).handle(command(Some("c1"))).await.unwrap();
        assert!(!session.created);
        let events: Vec<_> = session.events.collect().await;

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StreamEvent::Chunk(json!({"answer":"A","request_id":"r1"}).as_object().cloned().unwrap())
        );
        let StreamEvent::Done(summary) = &events[2] else {
            panic!("last event must be done");
        };
        assert_eq!(summary.response_text, "AB");
        assert_eq!(summary.conversation_id.as_str(), "c1");
        assert!(!summary.is_failure());
    }

    #[tokio::test]
    async fn transport_error_ends_with_failed_summary() {
        let provider = Arc::new(MockConversationProvider::new().with_reply(MockReply::Stream(vec![
            Ok(r#"data: {"answer":"A"}"#.to_string()),
            Err(UpstreamError::StreamInterrupted("reset".into())),
        ])));

        let session = handler(&provider).handle(command(Some("c1"))).await.unwrap();
        let events: Vec<_> = session.events.collect().await;

        let Some(StreamEvent::Done(summary)) = events.last() else {
            panic!("last event must be done");
        };
        assert!(summary.is_failure());
        assert_eq!(summary.result.error(), Some("stream interrupted: reset"));
        assert_eq!(summary.result.partial_answer(), Some("A"));
    }

    #[tokio::test]
    async fn eof_without_completion_still_ends_with_done() {
        let provider = Arc::new(
            MockConversationProvider::new().with_stream_lines([r#"data: {"answer":"part"}"#]),
        );

        let session = handler(&provider).handle(command(Some("c1"))).await.unwrap();
        let events: Vec<_> = session.events.collect().await;

        let Some(StreamEvent::Done(summary)) = events.last() else {
            panic!("last event must be done");
        };
        assert_eq!(summary.response_text, "part");
    }

    #[tokio::test]
    async fn creates_conversation_when_missing() {
        let provider = Arc::new(
            MockConversationProvider::new()
                .with_conversation("fresh")
                .with_stream_lines([r#"data: {"answer":"x","is_completion":true}"#]),
        );

        let session = handler(&provider).handle(command(None)).await.unwrap();

        assert!(session.created);
        assert_eq!(session.conversation_id.as_str(), "fresh");
        assert!(provider.send_calls()[0].stream);
    }

    #[tokio::test]
    async fn failure_before_stream_is_an_error() {
        let provider = Arc::new(MockConversationProvider::new().with_send_error(UpstreamError::timeout(120)));

        let err = handler(&provider).handle(command(Some("c1"))).await.unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_TIMEOUT");
    }
}
