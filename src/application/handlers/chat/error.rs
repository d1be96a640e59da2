//! Relay error taxonomy.

use crate::domain::foundation::ValidationError;
use crate::ports::UpstreamError;

/// Errors returned by the chat handlers.
///
/// Decode and extraction problems never show up here: the reducer and the
/// extractor absorb them into fallback text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Missing credential or app id after applying request overrides.
    #[error("{0}")]
    Configuration(String),

    /// Unusable input, such as an empty message.
    #[error("{0}")]
    Validation(String),

    /// The provider call failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(e) if e.is_timeout() => "UPSTREAM_TIMEOUT",
            Self::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

impl From<ValidationError> for RelayError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Rejects blank user messages.
pub(crate) fn require_message(message: &str) -> Result<(), RelayError> {
    if message.trim().is_empty() {
        return Err(RelayError::validation("Message content cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_error_kind() {
        assert_eq!(RelayError::configuration("x").code(), "CONFIGURATION_ERROR");
        assert_eq!(RelayError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(
            RelayError::from(UpstreamError::network("down")).code(),
            "UPSTREAM_ERROR"
        );
        assert_eq!(
            RelayError::from(UpstreamError::timeout(30)).code(),
            "UPSTREAM_TIMEOUT"
        );
    }

    #[test]
    fn blank_messages_are_rejected() {
        assert!(require_message("").is_err());
        assert!(require_message(" \n\t").is_err());
        assert!(require_message("hi").is_ok());
    }

    #[test]
    fn domain_validation_errors_convert() {
        let err: RelayError = ValidationError::empty_field("conversation_id").into();
        assert_eq!(
            err,
            RelayError::Validation("Field 'conversation_id' cannot be empty".to_string())
        );
    }
}
