//! HTTP adapters - REST API implementations.
//!
//! [`app_router`] assembles the chat routes with the cross-cutting layers:
//! CORS, request tracing and `x-request-id` propagation.

pub mod chat;

use axum::Router;
use tower::ServiceBuilder;
use ::http::{HeaderName, HeaderValue};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use chat::{chat_router, ChatApiError, ChatAppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Full application router with middleware applied.
pub fn app_router(state: ChatAppState, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    chat_router()
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        // CorsLayer requires a `Default` response body; keep it outside the trace stack
        .layer(build_cors(server))
        .with_state(state)
}

/// CORS rules from the configured origins; any origin when none are set.
pub fn build_cors(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}
