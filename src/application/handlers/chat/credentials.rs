//! Credential resolution: request overrides on top of configured defaults.

use secrecy::{ExposeSecret, Secret};

use super::error::RelayError;
use crate::config::ProviderConfig;
use crate::ports::ProviderCredentials;

/// Optional per-request credential overrides. Blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub token: Option<String>,
    pub app_id: Option<String>,
}

impl CredentialOverrides {
    pub fn new(token: Option<String>, app_id: Option<String>) -> Self {
        Self { token, app_id }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolves the credential and app id for each upstream call.
#[derive(Clone, Default)]
pub struct CredentialResolver {
    token: Option<Secret<String>>,
    app_id: Option<String>,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("token_configured", &self.has_token())
            .field("app_id", &self.app_id)
            .finish()
    }
}

impl CredentialResolver {
    pub fn new(token: Option<Secret<String>>, app_id: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.expose_secret().trim().is_empty()),
            app_id: app_id.filter(|a| !a.trim().is_empty()),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.token().cloned(), config.app_id().map(str::to_string))
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn token_len(&self) -> usize {
        self.token.as_ref().map(|t| t.expose_secret().len()).unwrap_or(0)
    }

    /// Configured default app id.
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Applies overrides, failing with a configuration error if either the
    /// credential or the app id is still missing.
    pub fn resolve(&self, overrides: &CredentialOverrides) -> Result<ProviderCredentials, RelayError> {
        let token = match non_blank(overrides.token.as_deref()) {
            Some(token) => Secret::new(token.to_string()),
            None => self.token.clone().ok_or_else(|| {
                tracing::error!("Provider token is not configured");
                RelayError::configuration(
                    "Missing authorization token. Configure CHAT_RELAY__PROVIDER__TOKEN or pass a token.",
                )
            })?,
        };

        let app_id = non_blank(overrides.app_id.as_deref())
            .or(self.app_id.as_deref())
            .ok_or_else(|| {
                tracing::error!("Provider app id is not configured");
                RelayError::configuration(
                    "Missing app id. Configure CHAT_RELAY__PROVIDER__APP_ID or pass an app_id.",
                )
            })?;

        Ok(ProviderCredentials::new(token, app_id))
    }
}
