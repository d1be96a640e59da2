//! Upstream provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Provider endpoint, default credentials and per-call timeouts.
///
/// `token` and `app_id` may be missing: requests can supply their own, and a
/// request that ends up without either fails with a configuration error.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential, with or without the `Bearer ` prefix
    pub token: Option<Secret<String>>,

    pub app_id: Option<String>,

    #[serde(default = "default_create_timeout")]
    pub create_timeout_secs: u64,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,

    #[serde(default = "default_history_timeout")]
    pub history_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    pub fn history_timeout(&self) -> Duration {
        Duration::from_secs(self.history_timeout_secs)
    }

    /// Configured token, ignoring blank values
    pub fn token(&self) -> Option<&Secret<String>> {
        self.token
            .as_ref()
            .filter(|t| !t.expose_secret().trim().is_empty())
    }

    /// Configured app id, ignoring blank values
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    pub fn token_len(&self) -> usize {
        self.token().map(|t| t.expose_secret().len()).unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl);
        }
        for (name, secs) in [
            ("create_timeout_secs", self.create_timeout_secs),
            ("send_timeout_secs", self.send_timeout_secs),
            ("stream_timeout_secs", self.stream_timeout_secs),
            ("history_timeout_secs", self.history_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ValidationError::InvalidTimeout(name));
            }
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            app_id: None,
            create_timeout_secs: default_create_timeout(),
            send_timeout_secs: default_send_timeout(),
            stream_timeout_secs: default_stream_timeout(),
            history_timeout_secs: default_history_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://qianfan.baidubce.com".to_string()
}

fn default_create_timeout() -> u64 {
    30
}

fn default_send_timeout() -> u64 {
    60
}

fn default_stream_timeout() -> u64 {
    120
}

fn default_history_timeout() -> u64 {
    30
}
