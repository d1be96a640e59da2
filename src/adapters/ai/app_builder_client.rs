//! App Builder Client - `ConversationProvider` over the provider's HTTP API.
//!
//! # Endpoints
//!
//! - `POST {base}/v2/app/conversation` opens a conversation
//! - `POST {base}/v2/app/conversation/runs` sends a message (optionally streamed)
//! - `GET {base}/v2/app/conversation/{id}/messages` returns history
//!
//! Every call is a single attempt bounded by its own timeout.
//!
//! # Streaming
//!
//! A streamed run answers with `data: {json}` lines. The client only frames
//! the body into lines; reduction happens in the application layer.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::domain::foundation::ConversationId;
use crate::domain::relay::sse;
use crate::ports::{
    ConversationProvider, CreatedConversation, MessageReply, ProviderCredentials,
    SendMessageRequest, UpstreamError,
};

/// Endpoint and timeout settings for the client.
#[derive(Debug, Clone)]
pub struct AppBuilderConfig {
    /// Base URL without trailing slash (default: https://qianfan.baidubce.com).
    pub base_url: String,
    pub create_timeout: Duration,
    pub send_timeout: Duration,
    pub stream_timeout: Duration,
    pub history_timeout: Duration,
}

impl Default for AppBuilderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://qianfan.baidubce.com".to_string(),
            create_timeout: Duration::from_secs(30),
            send_timeout: Duration::from_secs(60),
            stream_timeout: Duration::from_secs(120),
            history_timeout: Duration::from_secs(30),
        }
    }
}

impl AppBuilderConfig {
    pub fn from_provider_config(config: &ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            create_timeout: config.create_timeout(),
            send_timeout: config.send_timeout(),
            stream_timeout: config.stream_timeout(),
            history_timeout: config.history_timeout(),
        }
        .normalized()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self.normalized()
    }

    /// Applies one timeout to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self.send_timeout = timeout;
        self.stream_timeout = timeout;
        self.history_timeout = timeout;
        self
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }
}

#[derive(Debug, Serialize)]
struct CreateConversationBody<'a> {
    app_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RunBody<'a> {
    app_id: &'a str,
    conversation_id: &'a str,
    query: &'a str,
    stream: bool,
}

/// HTTP client for the app builder conversation API.
#[derive(Debug, Clone)]
pub struct AppBuilderClient {
    config: AppBuilderConfig,
    client: Client,
}

impl AppBuilderClient {
    pub fn new(config: AppBuilderConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UpstreamError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AppBuilderConfig {
        &self.config
    }

    fn conversation_url(&self) -> String {
        format!("{}/v2/app/conversation", self.config.base_url)
    }

    fn runs_url(&self) -> String {
        format!("{}/v2/app/conversation/runs", self.config.base_url)
    }

    fn history_url(&self, conversation_id: &ConversationId) -> String {
        format!(
            "{}/v2/app/conversation/{}/messages",
            self.config.base_url, conversation_id
        )
    }

    fn authorized(
        &self,
        builder: RequestBuilder,
        credentials: &ProviderCredentials,
        timeout: Duration,
    ) -> RequestBuilder {
        builder
            .header("Authorization", credentials.authorization_header())
            .header("Content-Type", "application/json")
            .timeout(timeout)
    }

    async fn send(builder: RequestBuilder, timeout: Duration) -> Result<Response, UpstreamError> {
        let response = builder
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        handle_response_status(response).await
    }
}

/// Maps reqwest failures onto the port's error type.
fn map_transport_error(e: reqwest::Error, timeout: Duration) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::timeout(timeout.as_secs())
    } else if e.is_connect() {
        UpstreamError::network(format!("Connection failed: {}", e))
    } else if e.is_decode() {
        UpstreamError::parse(e.to_string())
    } else {
        UpstreamError::network(e.to_string())
    }
}

async fn handle_response_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(status = status.as_u16(), body = %body, "Provider returned error status");

    match status.as_u16() {
        401 | 403 => Err(UpstreamError::AuthenticationFailed),
        code => Err(UpstreamError::status(code, body)),
    }
}

async fn read_json(response: Response) -> Result<Value, UpstreamError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| UpstreamError::parse(format!("Failed to parse response: {}", e)))
}

/// Pulls the conversation id out of a create-conversation reply.
fn parse_created(body: &Value) -> Result<CreatedConversation, UpstreamError> {
    let conversation_id = body
        .get("conversation_id")
        .and_then(Value::as_str)
        .and_then(|id| ConversationId::new(id).ok())
        .ok_or(UpstreamError::MissingConversationId)?;

    Ok(CreatedConversation {
        conversation_id,
        request_id: body
            .get("request_id")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl ConversationProvider for AppBuilderClient {
    async fn create_conversation(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CreatedConversation, UpstreamError> {
        tracing::info!(app_id = credentials.app_id(), "Creating conversation");
        let timeout = self.config.create_timeout;

        let request = self
            .authorized(self.client.post(self.conversation_url()), credentials, timeout)
            .json(&CreateConversationBody {
                app_id: credentials.app_id(),
            });

        let body = read_json(Self::send(request, timeout).await?).await?;
        let created = parse_created(&body)?;

        tracing::info!(conversation_id = %created.conversation_id, "Conversation created");
        Ok(created)
    }

    async fn send_message(
        &self,
        credentials: &ProviderCredentials,
        request: SendMessageRequest,
    ) -> Result<MessageReply, UpstreamError> {
        tracing::info!(
            conversation_id = %request.conversation_id,
            stream = request.stream,
            "Sending message"
        );
        let timeout = if request.stream {
            self.config.stream_timeout
        } else {
            self.config.send_timeout
        };

        let http_request = self
            .authorized(self.client.post(self.runs_url()), credentials, timeout)
            .json(&RunBody {
                app_id: credentials.app_id(),
                conversation_id: request.conversation_id.as_str(),
                query: &request.query,
                stream: request.stream,
            });

        let response = Self::send(http_request, timeout).await?;

        if !request.stream {
            return Ok(MessageReply::Direct(read_json(response).await?));
        }

        let bytes = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| match map_transport_error(e, timeout) {
                UpstreamError::Network(message) => UpstreamError::StreamInterrupted(message),
                other => other,
            })
        });
        Ok(MessageReply::Streamed(Box::pin(sse::into_lines(bytes))))
    }

    async fn conversation_history(
        &self,
        credentials: &ProviderCredentials,
        conversation_id: &ConversationId,
    ) -> Result<Value, UpstreamError> {
        tracing::debug!(conversation_id = %conversation_id, "Fetching conversation history");
        let timeout = self.config.history_timeout;

        let request = self
            .authorized(self.client.get(self.history_url(conversation_id)), credentials, timeout)
            .query(&[("app_id", credentials.app_id())]);

        read_json(Self::send(request, timeout).await?).await
    }
}
