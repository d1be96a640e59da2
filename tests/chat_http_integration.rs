//! Integration tests for the chat relay HTTP endpoints.
//!
//! These tests drive the full router (layers included) with a scripted
//! provider:
//! 1. Validation and configuration errors never reach the provider
//! 2. Conversations are created only when the request carries none
//! 3. Upstream failures map onto the error envelope
//! 4. The stream endpoint relays chunks as server-sent events

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use chat_relay::adapters::ai::{MockCall, MockConversationProvider};
use chat_relay::adapters::cache::InMemoryConversationCache;
use chat_relay::adapters::http::{app_router, ChatAppState};
use chat_relay::application::CredentialResolver;
use chat_relay::config::ServerConfig;
use chat_relay::domain::relay::PROCESSING_ERROR;
use chat_relay::ports::UpstreamError;

// =============================================================================
// Test Infrastructure
// =============================================================================

const TOKEN: &str = "super-secret-token";

fn configured() -> CredentialResolver {
    CredentialResolver::new(Some(Secret::new(TOKEN.to_string())), Some("app-1".to_string()))
}

fn app(provider: &Arc<MockConversationProvider>, credentials: CredentialResolver) -> Router {
    let cache = Arc::new(InMemoryConversationCache::new(
        Duration::from_secs(3600),
        Duration::from_secs(600),
    ));
    let state = ChatAppState::new(provider.clone(), cache, Arc::new(credentials));
    app_router(state, &ServerConfig::default())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

// =============================================================================
// Frontend and agent chat
// =============================================================================

#[tokio::test]
async fn frontend_chat_creates_conversation_and_returns_answer() {
    let provider = Arc::new(
        MockConversationProvider::new()
            .with_conversation("conv-1")
            .with_direct_reply(json!({"answer": "Hello there"})),
    );
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, post("/api/chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"conversation_id": "conv-1", "response": "Hello there", "success": true})
    );
    assert_eq!(provider.create_calls(), 1);
}

#[tokio::test]
async fn supplied_conversation_id_skips_creation() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let (status, body) = send_json(
        &app,
        post("/api/chat", json!({"message": "again", "conversation_id": "existing"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation_id"], json!("existing"));
    assert_eq!(provider.create_calls(), 0);
    assert_eq!(provider.send_calls()[0].conversation_id.as_str(), "existing");
}

#[tokio::test]
async fn empty_message_is_rejected_without_upstream_calls() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, post("/api/chat/agent-chat", json!({"message": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error_code"], json!("VALIDATION_ERROR"));
    assert!(body["timestamp"].is_string());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn malformed_body_uses_error_envelope() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn missing_credentials_report_configuration_error() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, CredentialResolver::new(None, None));

    let (status, body) = send_json(&app, post("/api/chat/agent-chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("CONFIGURATION_ERROR"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn request_overrides_replace_configured_credentials() {
    let provider = Arc::new(MockConversationProvider::new().with_conversation("conv-9"));
    let app = app(&provider, CredentialResolver::new(None, None));

    let (status, _) = send_json(
        &app,
        post(
            "/api/chat/agent-chat",
            json!({"message": "hi", "app_id": "other-app", "token": "override"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        provider.calls()[0],
        MockCall::CreateConversation {
            app_id: "other-app".to_string(),
            authorization: "Bearer override".to_string(),
        }
    );
}

#[tokio::test]
async fn upstream_timeout_maps_to_gateway_timeout() {
    let provider = Arc::new(MockConversationProvider::new().with_send_error(UpstreamError::timeout(60)));
    let app = app(&provider, configured());

    let (status, body) = send_json(
        &app,
        post("/api/chat/agent-chat", json!({"message": "hi", "conversation_id": "c1"})),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error_code"], json!("UPSTREAM_TIMEOUT"));
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let provider = Arc::new(
        MockConversationProvider::new().with_create_error(UpstreamError::status(500, "stack trace")),
    );
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, post("/api/chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], json!("UPSTREAM_ERROR"));
    assert!(!body["error"].as_str().unwrap().contains("stack trace"));
}

#[tokio::test]
async fn unrecognized_reply_shape_yields_placeholder_text() {
    let provider = Arc::new(
        MockConversationProvider::new().with_direct_reply(json!({"something": "else"})),
    );
    let app = app(&provider, configured());

    let (status, body) = send_json(
        &app,
        post("/api/chat", json!({"message": "hi", "conversation_id": "c1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        json!("Sorry, I could not understand that question for now.")
    );
}

#[tokio::test]
async fn non_object_reply_yields_processing_error_text() {
    let provider = Arc::new(MockConversationProvider::new().with_direct_reply(json!(["hi"])));
    let app = app(&provider, configured());

    let (status, body) = send_json(
        &app,
        post("/api/chat/agent-chat", json!({"message": "hi", "conversation_id": "c1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["response"], json!(PROCESSING_ERROR));
}

// =============================================================================
// Granular endpoints
// =============================================================================

#[tokio::test]
async fn create_conversation_returns_envelope() {
    let provider = Arc::new(MockConversationProvider::new().with_conversation("conv-2"));
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, post("/api/chat/conversation", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": {"conversation_id": "conv-2", "request_id": "req-conv-2", "app_id": "app-1"}
        })
    );
}

#[tokio::test]
async fn send_message_aggregates_streamed_reply() {
    let provider = Arc::new(MockConversationProvider::new().with_stream_lines([
        r#"data: {"answer":"Hel","request_id":"r1"}"#,
        r#"data: {"answer":"lo","message_id":"m1","is_completion":true}"#,
    ]));
    let app = app(&provider, configured());

    let (status, body) = send_json(
        &app,
        post(
            "/api/chat/message",
            json!({"conversation_id": "c1", "message": "hi", "stream": true}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["response_text"], json!("Hello"));
    assert_eq!(body["data"]["request_id"], json!("r1"));
    assert_eq!(body["data"]["message_id"], json!("m1"));
    assert!(provider.send_calls()[0].stream);
}

#[tokio::test]
async fn send_message_requires_conversation_id() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let (status, body) =
        send_json(&app, post("/api/chat/message", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("VALIDATION_ERROR"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn quick_chat_returns_conversation_and_message() {
    let provider = Arc::new(
        MockConversationProvider::new()
            .with_conversation("conv-3")
            .with_direct_reply(json!({"answer": "quick"})),
    );
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, post("/api/chat/quick-chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["conversation"]["conversation_id"], json!("conv-3"));
    assert_eq!(body["data"]["message_response"]["response_text"], json!("quick"));
}

#[tokio::test]
async fn history_passes_provider_body_through() {
    let provider = Arc::new(
        MockConversationProvider::new().with_history(Ok(json!({"data": [{"query": "hi"}]}))),
    );
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, get("/api/chat/history/conv-1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"data": [{"query": "hi"}]}));
}

#[tokio::test]
async fn conversations_lists_created_conversations() {
    let provider = Arc::new(
        MockConversationProvider::new()
            .with_conversation("conv-a")
            .with_conversation("conv-b"),
    );
    let app = app(&provider, configured());

    send(&app, post("/api/chat/conversation", json!({}))).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    send(&app, post("/api/chat/conversation", json!({}))).await;
    let (status, body) = send_json(&app, get("/api/chat/conversations?limit=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(1));
    assert_eq!(body["data"]["conversations"][0]["conversation_id"], json!("conv-b"));
}

#[tokio::test]
async fn forgetting_a_conversation_removes_it_from_listing() {
    let provider = Arc::new(MockConversationProvider::new().with_conversation("conv-x"));
    let app = app(&provider, configured());
    send(&app, post("/api/chat/conversation", json!({}))).await;

    let delete = Request::builder()
        .method("DELETE")
        .uri("/api/chat/conversations/conv-x")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, delete).await;
    let (_, listing) = send_json(&app, get("/api/chat/conversations")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"conversation_id": "conv-x", "deleted": true}));
    assert_eq!(listing["data"]["total"], json!(0));
}

#[tokio::test]
async fn diagnostics_never_echo_the_token() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let (status, body) = send(&app, get("/api/chat/test")).await;
    let json: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains(TOKEN));
    assert_eq!(json["config_status"]["token_configured"], json!(true));
    assert_eq!(json["config_status"]["token_length"], json!(TOKEN.len()));
    assert_eq!(json["config_status"]["app_id"], json!("app-1"));
}

#[tokio::test]
async fn diagnostics_report_missing_configuration() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, CredentialResolver::new(None, None));

    let (_, body) = send_json(&app, get("/api/chat/test")).await;

    assert_eq!(body["config_status"]["token_configured"], json!(false));
    assert_eq!(body["config_status"]["app_id"], json!("not configured"));
}

// =============================================================================
// Streaming and liveness
// =============================================================================

#[tokio::test]
async fn stream_relays_chunks_then_done() {
    let provider = Arc::new(
        MockConversationProvider::new()
            .with_conversation("conv-s")
            .with_stream_lines([
                r#"data: {"answer":"Hel"}"#,
                r#"data: {"answer":"lo","is_completion":true}"#,
            ]),
    );
    let app = app(&provider, configured());

    let (status, body) = send(&app, post("/api/chat/stream", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: conversation"));
    assert_eq!(body.matches("event: chunk").count(), 2);
    assert!(body.contains("event: done"));
    assert!(body.contains(r#""response":"Hello""#));
}

#[tokio::test]
async fn stream_failure_ends_with_error_event() {
    let provider = Arc::new(MockConversationProvider::new().with_reply(
        chat_relay::adapters::ai::MockReply::Stream(vec![
            Ok(r#"data: {"answer":"part"}"#.to_string()),
            Err(UpstreamError::StreamInterrupted("reset".into())),
        ]),
    ));
    let app = app(&provider, configured());

    let (status, body) = send(
        &app,
        post("/api/chat/stream", json!({"message": "hi", "conversation_id": "c1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: chunk"));
    assert!(body.contains("event: error"));
    assert!(!body.contains("event: done"));
    assert!(body.contains(r#""partial_answer":"part""#));
}

#[tokio::test]
async fn stream_with_empty_message_is_rejected_before_streaming() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let (status, body) = send_json(&app, post("/api/chat/stream", json!({"message": ""}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn health_endpoints_respond() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let (root_status, _) = send_json(&app, get("/")).await;
    let (health_status, body) = send_json(&app, get("/health")).await;

    assert_eq!(root_status, StatusCode::OK);
    assert_eq!(health_status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn cors_headers_are_applied() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let provider = Arc::new(MockConversationProvider::new());
    let app = app(&provider, configured());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
