//! Axum routes for the chat relay endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{
    agent_chat, conversation_history, create_conversation, diagnostics, forget_conversation,
    frontend_chat, health, list_conversations, quick_chat, root, send_message, stream_chat, ChatAppState,
};

/// Creates routes for chat endpoints.
///
/// - POST /chat - Frontend chat turn
/// - POST /chat/agent-chat - Chat turn with credential overrides
/// - POST /chat/conversation - Open a conversation
/// - POST /chat/message - Send into an existing conversation
/// - POST /chat/quick-chat - Open and send in one call
/// - POST /chat/stream - Server-sent events relay
/// - GET /chat/history/{conversation_id} - Provider history
/// - GET /chat/conversations - Cached conversations
/// - DELETE /chat/conversations/{conversation_id} - Forget a cached conversation
/// - GET /chat/test - Configuration diagnostics
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(frontend_chat))
        .route("/chat/agent-chat", post(agent_chat))
        .route("/chat/conversation", post(create_conversation))
        .route("/chat/message", post(send_message))
        .route("/chat/quick-chat", post(quick_chat))
        .route("/chat/stream", post(stream_chat))
        .route("/chat/history/{conversation_id}", get(conversation_history))
        .route("/chat/conversations", get(list_conversations))
        .route("/chat/conversations/{conversation_id}", delete(forget_conversation))
        .route("/chat/test", get(diagnostics))
}

/// Liveness routes at the root.
pub fn health_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// Combined router: chat routes under /api plus liveness.
pub fn chat_router() -> Router<ChatAppState> {
    Router::new()
        .nest("/api", chat_routes())
        .merge(health_routes())
}
