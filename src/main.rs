//! Chat relay server entry point.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chat_relay::adapters::ai::{AppBuilderClient, AppBuilderConfig};
use chat_relay::adapters::cache::InMemoryConversationCache;
use chat_relay::adapters::http::{app_router, ChatAppState};
use chat_relay::application::CredentialResolver;
use chat_relay::config::AppConfig;
use chat_relay::ports::ConversationCache;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let credentials = Arc::new(CredentialResolver::from_config(&config.provider));
    if !credentials.has_token() || credentials.app_id().is_none() {
        tracing::warn!(
            token_configured = credentials.has_token(),
            app_id_configured = credentials.app_id().is_some(),
            "Provider credentials incomplete; requests must supply overrides"
        );
    }

    let provider = Arc::new(AppBuilderClient::new(AppBuilderConfig::from_provider_config(
        &config.provider,
    ))?);
    let cache = Arc::new(InMemoryConversationCache::from_config(&config.cache));
    spawn_cache_sweeper(cache.clone(), config.cache.cleanup_interval());

    let state = ChatAppState::new(provider, cache, credentials);
    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Chat relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Chat relay stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn spawn_cache_sweeper(cache: Arc<InMemoryConversationCache>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.evict_expired().await;
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
