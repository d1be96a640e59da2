//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `CHAT_RELAY` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use chat_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod cache;
mod error;
mod provider;
mod server;

pub use cache::CacheConfig;
pub use error::{ConfigError, ValidationError};
pub use provider::ProviderConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// (if credential-less) relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream provider (endpoint, default credentials, timeouts)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Conversation cache eviction
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT_RELAY__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `CHAT_RELAY__PROVIDER__TOKEN=...` -> `provider.token = ...`
    /// - `CHAT_RELAY__PROVIDER__APP_ID=...` -> `provider.app_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Missing provider credentials are not an error here; they are reported
    /// per request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.provider.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
