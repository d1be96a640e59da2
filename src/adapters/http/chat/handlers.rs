//! HTTP handlers for the chat relay endpoints.
//!
//! These handlers connect axum routes to the application layer chat
//! handlers. Every failure goes out as the uniform error envelope.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use super::dto::{
    overrides, AgentChatRequest, AgentChatResponse, ConfigStatus, ConversationList,
    ConversationView, CreateConversationRequest, ForgottenConversation, CredentialParams, DiagnosticsResponse,
    ErrorResponse, FrontendChatRequest, FrontendChatResponse, HealthResponse, ListParams,
    MessageView, QuickChatRequest, QuickChatView, SendMessageRequest, StreamChatRequest,
    StreamDone, StreamOpened, SuccessResponse,
};
use crate::application::handlers::chat::{
    AgentChatCommand, AgentChatHandler, CreateConversationCommand, CreateConversationHandler,
    CredentialResolver, ForgetConversationCommand, ForgetConversationHandler,
    GetConversationHistoryHandler, GetConversationHistoryQuery,
    ListConversationsHandler, ListConversationsQuery, QuickChatCommand, QuickChatHandler,
    RelayError, SendMessageCommand, SendMessageHandler, StreamChatCommand, StreamChatHandler,
    StreamEvent, DEFAULT_LIST_LIMIT,
};
use crate::domain::foundation::ConversationId;
use crate::domain::relay::ResponseExtractor;
use crate::ports::{ConversationCache, ConversationProvider, UpstreamError};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the chat routes.
#[derive(Clone)]
pub struct ChatAppState {
    pub provider: Arc<dyn ConversationProvider>,
    pub cache: Arc<dyn ConversationCache>,
    pub credentials: Arc<CredentialResolver>,
    pub extractor: Arc<ResponseExtractor>,
}

impl ChatAppState {
    pub fn new(
        provider: Arc<dyn ConversationProvider>,
        cache: Arc<dyn ConversationCache>,
        credentials: Arc<CredentialResolver>,
    ) -> Self {
        Self {
            provider,
            cache,
            credentials,
            extractor: Arc::new(ResponseExtractor::default()),
        }
    }

    fn agent_chat(&self) -> AgentChatHandler<dyn ConversationProvider> {
        AgentChatHandler::new(
            self.provider.clone(),
            self.cache.clone(),
            self.credentials.clone(),
            self.extractor.clone(),
        )
    }

    fn create_conversation(&self) -> CreateConversationHandler<dyn ConversationProvider> {
        CreateConversationHandler::new(
            self.provider.clone(),
            self.cache.clone(),
            self.credentials.clone(),
        )
    }

    fn send_message(&self) -> SendMessageHandler<dyn ConversationProvider> {
        SendMessageHandler::new(
            self.provider.clone(),
            self.cache.clone(),
            self.credentials.clone(),
            self.extractor.clone(),
        )
    }

    fn quick_chat(&self) -> QuickChatHandler<dyn ConversationProvider> {
        QuickChatHandler::new(
            self.provider.clone(),
            self.cache.clone(),
            self.credentials.clone(),
            self.extractor.clone(),
        )
    }

    fn stream_chat(&self) -> StreamChatHandler<dyn ConversationProvider> {
        StreamChatHandler::new(
            self.provider.clone(),
            self.cache.clone(),
            self.credentials.clone(),
            self.extractor.clone(),
        )
    }

    fn history(&self) -> GetConversationHistoryHandler<dyn ConversationProvider> {
        GetConversationHistoryHandler::new(self.provider.clone(), self.credentials.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub enum ChatApiError {
    /// Body was not valid JSON for the endpoint.
    BadRequest(String),
    Relay(RelayError),
}

impl From<RelayError> for ChatApiError {
    fn from(err: RelayError) -> Self {
        ChatApiError::Relay(err)
    }
}

impl From<JsonRejection> for ChatApiError {
    fn from(rejection: JsonRejection) -> Self {
        ChatApiError::BadRequest(rejection.body_text())
    }
}

impl ChatApiError {
    fn status(&self) -> StatusCode {
        match self {
            ChatApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ChatApiError::Relay(RelayError::Configuration(_) | RelayError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            ChatApiError::Relay(RelayError::Upstream(e)) if e.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ChatApiError::Relay(RelayError::Upstream(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ChatApiError::BadRequest(_) => "VALIDATION_ERROR",
            ChatApiError::Relay(err) => err.code(),
        }
    }

    /// Client-facing message. Provider bodies stay in the logs.
    fn message(&self) -> String {
        match self {
            ChatApiError::BadRequest(detail) => format!("Invalid request body: {}", detail),
            ChatApiError::Relay(RelayError::Upstream(e)) => match e {
                UpstreamError::Timeout { timeout_secs } => {
                    format!("AI service did not respond within {}s", timeout_secs)
                }
                UpstreamError::AuthenticationFailed => {
                    "AI service rejected the configured credentials".to_string()
                }
                UpstreamError::Status { status, .. } => {
                    format!("AI service returned status {}", status)
                }
                other => format!("AI service request failed: {}", other),
            },
            ChatApiError::Relay(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ChatApiError::Relay(RelayError::Upstream(e)) => {
                tracing::error!(error = %e, status = status.as_u16(), "Upstream call failed");
            }
            other => {
                tracing::warn!(error = ?other, status = status.as_u16(), "Rejected chat request");
            }
        }

        let body = ErrorResponse::new(self.code(), self.message());
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ChatApiError>;

// ════════════════════════════════════════════════════════════════════════════════
// Chat Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat - Frontend chat turn
pub async fn frontend_chat(
    State(state): State<ChatAppState>,
    body: Result<Json<FrontendChatRequest>, JsonRejection>,
) -> ApiResult<FrontendChatResponse> {
    let Json(request) = body?;
    tracing::info!(
        message_len = request.message.len(),
        has_conversation = request.conversation_id.is_some(),
        "Frontend chat request"
    );

    let result = state
        .agent_chat()
        .handle(AgentChatCommand {
            message: request.message,
            conversation_id: request.conversation_id,
            stream: false,
            ..Default::default()
        })
        .await?;

    Ok(Json(FrontendChatResponse {
        conversation_id: result.conversation_id,
        response: result.response_text,
        success: true,
    }))
}

/// POST /api/chat/agent-chat - Chat turn with explicit options
pub async fn agent_chat(
    State(state): State<ChatAppState>,
    body: Result<Json<AgentChatRequest>, JsonRejection>,
) -> ApiResult<AgentChatResponse> {
    let Json(request) = body?;
    tracing::info!(
        message_len = request.message.len(),
        stream = request.stream,
        has_conversation = request.conversation_id.is_some(),
        "Agent chat request"
    );

    let result = state
        .agent_chat()
        .handle(AgentChatCommand {
            message: request.message,
            conversation_id: request.conversation_id,
            stream: request.stream,
            overrides: overrides(request.token, request.app_id),
        })
        .await?;

    Ok(Json(result.into()))
}

/// POST /api/chat/conversation - Open a conversation
pub async fn create_conversation(
    State(state): State<ChatAppState>,
    body: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse<ConversationView>> {
    let Json(request) = body?;

    let result = state
        .create_conversation()
        .handle(CreateConversationCommand {
            overrides: overrides(request.token, request.app_id),
        })
        .await?;

    Ok(Json(SuccessResponse::new(result.into())))
}

/// POST /api/chat/message - Send into an existing conversation
pub async fn send_message(
    State(state): State<ChatAppState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse<MessageView>> {
    let Json(request) = body?;
    let conversation_id = ConversationId::new(request.conversation_id).map_err(RelayError::from)?;

    let result = state
        .send_message()
        .handle(SendMessageCommand {
            conversation_id,
            message: request.message,
            stream: request.stream,
            overrides: overrides(request.token, request.app_id),
        })
        .await?;

    Ok(Json(SuccessResponse::new(result.into())))
}

/// POST /api/chat/quick-chat - New conversation plus first message
pub async fn quick_chat(
    State(state): State<ChatAppState>,
    body: Result<Json<QuickChatRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse<QuickChatView>> {
    let Json(request) = body?;

    let result = state
        .quick_chat()
        .handle(QuickChatCommand {
            message: request.message,
            stream: request.stream,
            overrides: overrides(request.token, request.app_id),
        })
        .await?;

    Ok(Json(SuccessResponse::new(QuickChatView {
        conversation: result.conversation.into(),
        message_response: result.message.into(),
    })))
}

/// POST /api/chat/stream - Relay provider chunks as server-sent events
///
/// Emits one `conversation` event, then a `chunk` event per provider chunk,
/// then a final `done` event (`error` when the stream broke).
pub async fn stream_chat(
    State(state): State<ChatAppState>,
    body: Result<Json<StreamChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + Send>, ChatApiError> {
    let Json(request) = body?;

    let session = state
        .stream_chat()
        .handle(StreamChatCommand {
            message: request.message,
            conversation_id: request.conversation_id,
            overrides: overrides(request.token, request.app_id),
        })
        .await?;

    let opened = json_event(
        "conversation",
        &StreamOpened {
            conversation_id: session.conversation_id.clone(),
            created: session.created,
        },
    );

    let events = session.events.map(|event| {
        let sse = match event {
            StreamEvent::Chunk(fields) => json_event("chunk", &fields),
            StreamEvent::Done(summary) => {
                let name = if summary.is_failure() { "error" } else { "done" };
                json_event(name, &StreamDone::from(summary))
            }
        };
        Ok::<_, Infallible>(sse)
    });

    let body = stream::once(async move { Ok::<_, Infallible>(opened) }).chain(events);
    Ok(Sse::new(body).keep_alive(KeepAlive::default()))
}

fn json_event<T: Serialize>(name: &'static str, payload: &T) -> Event {
    match Event::default().event(name).json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, event = name, "Failed to encode SSE payload");
            Event::default().event("error").data("failed to encode event")
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/chat/history/{conversation_id} - Provider history passthrough
pub async fn conversation_history(
    State(state): State<ChatAppState>,
    Path(conversation_id): Path<String>,
    Query(params): Query<CredentialParams>,
) -> ApiResult<SuccessResponse<serde_json::Value>> {
    let conversation_id = ConversationId::new(conversation_id).map_err(RelayError::from)?;

    let history = state
        .history()
        .handle(GetConversationHistoryQuery {
            conversation_id,
            overrides: overrides(params.token, params.app_id),
        })
        .await?;

    Ok(Json(SuccessResponse::new(history)))
}

/// GET /api/chat/conversations - Conversations known to this process
pub async fn list_conversations(
    State(state): State<ChatAppState>,
    Query(params): Query<ListParams>,
) -> Json<SuccessResponse<ConversationList>> {
    let conversations = ListConversationsHandler::new(state.cache.clone())
        .handle(ListConversationsQuery {
            limit: params.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        })
        .await;

    Json(SuccessResponse::new(ConversationList {
        total: conversations.len(),
        conversations,
    }))
}

/// DELETE /api/chat/conversations/{conversation_id} - Drop a cached conversation
pub async fn forget_conversation(
    State(state): State<ChatAppState>,
    Path(conversation_id): Path<String>,
) -> ApiResult<SuccessResponse<ForgottenConversation>> {
    let conversation_id = ConversationId::new(conversation_id).map_err(RelayError::from)?;

    let deleted = ForgetConversationHandler::new(state.cache.clone())
        .handle(ForgetConversationCommand {
            conversation_id: conversation_id.clone(),
        })
        .await;

    Ok(Json(SuccessResponse::new(ForgottenConversation {
        conversation_id,
        deleted,
    })))
}

/// GET /api/chat/test - Configuration diagnostics; never echoes the token
pub async fn diagnostics(State(state): State<ChatAppState>) -> Json<DiagnosticsResponse> {
    let credentials = &state.credentials;
    Json(DiagnosticsResponse {
        success: true,
        message: "Chat relay is running".to_string(),
        endpoints: ENDPOINTS.to_vec(),
        config_status: ConfigStatus {
            token_configured: credentials.has_token(),
            app_id_configured: credentials.app_id().is_some(),
            token_length: credentials.token_len(),
            app_id: credentials
                .app_id()
                .unwrap_or("not configured")
                .to_string(),
        },
    })
}

const ENDPOINTS: &[&str] = &[
    "POST /api/chat",
    "POST /api/chat/agent-chat",
    "POST /api/chat/conversation",
    "POST /api/chat/message",
    "POST /api/chat/quick-chat",
    "POST /api/chat/stream",
    "GET /api/chat/history/{conversation_id}",
    "GET /api/chat/conversations",
    "DELETE /api/chat/conversations/{conversation_id}",
    "GET /api/chat/test",
];

// ════════════════════════════════════════════════════════════════════════════════
// Liveness
// ════════════════════════════════════════════════════════════════════════════════

/// GET /
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Chat relay API is running",
    })
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Chat relay is healthy",
    })
}
