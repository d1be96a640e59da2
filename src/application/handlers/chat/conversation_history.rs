//! GetConversationHistoryHandler - Provider-side message history, passed through.

use serde_json::Value;
use std::sync::Arc;

use super::credentials::{CredentialOverrides, CredentialResolver};
use super::error::RelayError;
use crate::domain::foundation::ConversationId;
use crate::ports::ConversationProvider;

#[derive(Debug, Clone)]
pub struct GetConversationHistoryQuery {
    pub conversation_id: ConversationId,
    pub overrides: CredentialOverrides,
}

pub struct GetConversationHistoryHandler<P: ?Sized + ConversationProvider> {
    provider: Arc<P>,
    credentials: Arc<CredentialResolver>,
}

impl<P: ?Sized + ConversationProvider> GetConversationHistoryHandler<P> {
    pub fn new(provider: Arc<P>, credentials: Arc<CredentialResolver>) -> Self {
        Self {
            provider,
            credentials,
        }
    }

    pub async fn handle(&self, query: GetConversationHistoryQuery) -> Result<Value, RelayError> {
        let credentials = self.credentials.resolve(&query.overrides)?;
        self.provider
            .conversation_history(&credentials, &query.conversation_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, conversation_id = %query.conversation_id, "Failed to fetch history");
                RelayError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockCall, MockConversationProvider};
    use crate::application::handlers::chat::test_support::{overrides, resolver};
    use crate::ports::UpstreamError;
    use serde_json::json;

    fn query(app_id: Option<&str>) -> GetConversationHistoryQuery {
        GetConversationHistoryQuery {
            conversation_id: ConversationId::new("c1").unwrap(),
            overrides: overrides(None, app_id),
        }
    }

    #[tokio::test]
    async fn passes_provider_json_through() {
        let history = json!({"data": [{"role": "user", "content": "hi"}]});
        let provider = Arc::new(MockConversationProvider::new().with_history(Ok(history.clone())));
        let handler = GetConversationHistoryHandler::new(provider.clone(), resolver());

        assert_eq!(handler.handle(query(Some("app-x"))).await.unwrap(), history);
        assert_eq!(
            provider.calls(),
            vec![MockCall::ConversationHistory {
                app_id: "app-x".into(),
                conversation_id: ConversationId::new("c1").unwrap(),
            }]
        );
    }

    #[tokio::test]
    async fn upstream_errors_propagate() {
        let provider = Arc::new(
            MockConversationProvider::new().with_history(Err(UpstreamError::status(404, "missing"))),
        );
        let handler = GetConversationHistoryHandler::new(provider, resolver());

        let err = handler.handle(query(None)).await.unwrap_err();
        assert_eq!(err, RelayError::Upstream(UpstreamError::status(404, "missing")));
    }
}
