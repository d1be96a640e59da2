//! Data Transfer Objects for the chat relay endpoints.
//!
//! Request bodies default every field, so a missing `message` reaches the
//! handlers as an empty string and is rejected with a validation error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::handlers::chat::{
    AgentChatResult, CreateConversationResult, CredentialOverrides, SendMessageResult,
    StreamSummary,
};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::CachedConversation;

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/chat` (frontend shape).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontendChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

/// Body of `POST /api/chat/agent-chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub stream: bool,
    pub app_id: Option<String>,
    pub token: Option<String>,
}

/// Body of `POST /api/chat/conversation`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateConversationRequest {
    pub app_id: Option<String>,
    pub token: Option<String>,
}

/// Body of `POST /api/chat/message`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    pub conversation_id: String,
    pub message: String,
    pub stream: bool,
    pub app_id: Option<String>,
    pub token: Option<String>,
}

/// Body of `POST /api/chat/quick-chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuickChatRequest {
    pub message: String,
    pub stream: bool,
    pub app_id: Option<String>,
    pub token: Option<String>,
}

/// Body of `POST /api/chat/stream`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub app_id: Option<String>,
    pub token: Option<String>,
}

/// Query of `GET /api/chat/history/{conversation_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialParams {
    pub app_id: Option<String>,
    pub token: Option<String>,
}

/// Query of `GET /api/chat/conversations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

pub(crate) fn overrides(token: Option<String>, app_id: Option<String>) -> CredentialOverrides {
    CredentialOverrides::new(token, app_id)
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// `{success: true, data}` wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct FrontendChatResponse {
    pub conversation_id: ConversationId,
    pub response: String,
    pub success: bool,
}

/// Reply of `POST /api/chat/agent-chat`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentChatResponse {
    pub success: bool,
    pub conversation_id: ConversationId,
    pub response: String,
    pub request_id: Option<String>,
    pub message_id: Option<String>,
}

impl From<AgentChatResult> for AgentChatResponse {
    fn from(result: AgentChatResult) -> Self {
        Self {
            success: true,
            conversation_id: result.conversation_id,
            response: result.response_text,
            request_id: result.request_id,
            message_id: result.message_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub conversation_id: ConversationId,
    pub request_id: Option<String>,
    pub app_id: String,
}

impl From<CreateConversationResult> for ConversationView {
    fn from(result: CreateConversationResult) -> Self {
        Self {
            conversation_id: result.conversation_id,
            request_id: result.request_id,
            app_id: result.app_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub conversation_id: ConversationId,
    pub response_text: String,
    pub request_id: Option<String>,
    pub message_id: Option<String>,
    /// Provider result as received (aggregated when streamed)
    pub raw: Value,
}

impl From<SendMessageResult> for MessageView {
    fn from(result: SendMessageResult) -> Self {
        Self {
            conversation_id: result.conversation_id,
            response_text: result.response_text,
            request_id: result.request_id,
            message_id: result.message_id,
            raw: result.raw,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickChatView {
    pub conversation: ConversationView,
    pub message_response: MessageView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationList {
    pub conversations: Vec<CachedConversation>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgottenConversation {
    pub conversation_id: ConversationId,
    pub deleted: bool,
}

/// Payload of the SSE `conversation` event.
#[derive(Debug, Clone, Serialize)]
pub struct StreamOpened {
    pub conversation_id: ConversationId,
    pub created: bool,
}

/// Payload of the SSE `done` / `error` event.
#[derive(Debug, Clone, Serialize)]
pub struct StreamDone {
    pub conversation_id: ConversationId,
    pub response: String,
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<StreamSummary> for StreamDone {
    fn from(summary: StreamSummary) -> Self {
        let error = summary.result.error().map(str::to_string);
        Self {
            conversation_id: summary.conversation_id,
            response: summary.response_text,
            result: summary.result.into_value(),
            error,
        }
    }
}

/// Reply of `GET /api/chat/test`.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsResponse {
    pub success: bool,
    pub message: String,
    pub endpoints: Vec<&'static str>,
    pub config_status: ConfigStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub token_configured: bool,
    pub app_id_configured: bool,
    pub token_length: usize,
    pub app_id: String,
}

/// Reply of `GET /` and `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Uniform error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            error_code: error_code.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_tolerate_missing_fields() {
        let request: AgentChatRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.message, "");
        assert!(!request.stream);
        assert!(request.conversation_id.is_none());
    }

    #[test]
    fn error_envelope_shape() {
        let value = serde_json::to_value(ErrorResponse::new("VALIDATION_ERROR", "empty")).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("empty"));
        assert_eq!(value["error_code"], json!("VALIDATION_ERROR"));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn agent_chat_response_serializes_ids() {
        let response = AgentChatResponse::from(AgentChatResult {
            conversation_id: ConversationId::new("c1").unwrap(),
            response_text: "hi".into(),
            request_id: Some("r1".into()),
            message_id: None,
            created: true,
        });
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "success": true,
                "conversation_id": "c1",
                "response": "hi",
                "request_id": "r1",
                "message_id": null
            })
        );
    }
}
