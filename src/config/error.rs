//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Provider base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Timeout '{0}' must be greater than zero")]
    InvalidTimeout(&'static str),

    #[error("Cache interval '{0}' must be greater than zero")]
    InvalidCacheInterval(&'static str),
}
