//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Provider-issued handle identifying a chat session's context.
///
/// The value is opaque to the relay: it is never parsed, only carried
/// between the frontend and the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Creates a ConversationId, rejecting blank values.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("conversation_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_accepts_opaque_values() {
        let id = ConversationId::new("c7f1-abc").unwrap();
        assert_eq!(id.as_str(), "c7f1-abc");
        assert_eq!(id.to_string(), "c7f1-abc");
    }

    #[test]
    fn conversation_id_rejects_blank() {
        assert!(ConversationId::new("").is_err());
        assert!("   ".parse::<ConversationId>().is_err());
    }

    #[test]
    fn conversation_id_serializes_transparently() {
        let id = ConversationId::new("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");

        let parsed: ConversationId = serde_json::from_str("\"xyz\"").unwrap();
        assert_eq!(parsed.as_str(), "xyz");
    }
}
