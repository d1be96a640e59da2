//! Conversation Provider Adapters.
//!
//! - `AppBuilderClient` - HTTP client for the app builder conversation API
//! - `MockConversationProvider` - scripted provider for tests

mod app_builder_client;
mod mock_provider;

pub use app_builder_client::{AppBuilderClient, AppBuilderConfig};
pub use mock_provider::{MockCall, MockConversationProvider, MockReply};
