//! Response extractor - picks the display text out of a provider result.
//!
//! Providers have returned the answer in several shapes over time. Each shape
//! is an [`ExtractionStrategy`]; strategies are tried in order and the first
//! match wins. Extraction never fails outward: anything unexpected degrades
//! to a fixed fallback sentence.

use serde_json::{Map, Value};

use super::aggregate::AggregatedResult;

/// Returned when no strategy matched.
pub const NOT_UNDERSTOOD: &str = "Sorry, I could not understand that question for now.";

/// Returned when the result could not be inspected at all.
pub const PROCESSING_ERROR: &str = "Sorry, an error occurred while processing the reply.";

/// Why extraction could not even be attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("provider result is not a JSON object (got {0})")]
    NotAnObject(&'static str),
}

/// One known response shape.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the text if the result has this shape.
    fn extract(&self, result: &Map<String, Value>) -> Option<String>;
}

/// `{"answer": "..."}` with a non-empty answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerField;

impl ExtractionStrategy for AnswerField {
    fn name(&self) -> &'static str {
        "answer"
    }

    fn extract(&self, result: &Map<String, Value>) -> Option<String> {
        result
            .get("answer")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// `{"content": [{"content_type": "text", "outputs": {"text": "..."}}]}`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextContentOutputs;

impl ExtractionStrategy for TextContentOutputs {
    fn name(&self) -> &'static str {
        "content.outputs.text"
    }

    fn extract(&self, result: &Map<String, Value>) -> Option<String> {
        result
            .get("content")?
            .as_array()?
            .iter()
            .filter(|entry| entry.get("content_type").and_then(Value::as_str) == Some("text"))
            .find_map(|entry| {
                entry
                    .get("outputs")
                    .and_then(|outputs| outputs.get("text"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
    }
}

/// Legacy `{"result": {"text": "..."}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultText;

impl ExtractionStrategy for ResultText {
    fn name(&self) -> &'static str {
        "result.text"
    }

    fn extract(&self, result: &Map<String, Value>) -> Option<String> {
        result
            .get("result")?
            .as_object()?
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Ordered list of strategies.
pub struct ResponseExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(AnswerField),
            Box::new(TextContentOutputs),
            Box::new(ResultText),
        ])
    }
}

impl std::fmt::Debug for ResponseExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("ResponseExtractor")
            .field("strategies", &names)
            .finish()
    }
}

impl ResponseExtractor {
    /// Creates an extractor with a custom strategy order.
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Runs the strategies; `Ok(None)` means nothing matched.
    pub fn try_extract(&self, result: &Value) -> Result<Option<String>, ExtractionError> {
        let fields = result
            .as_object()
            .ok_or_else(|| ExtractionError::NotAnObject(json_kind(result)))?;
        Ok(self.first_match(fields))
    }

    fn first_match(&self, fields: &Map<String, Value>) -> Option<String> {
        self.strategies.iter().find_map(|strategy| {
            let text = strategy.extract(fields)?;
            tracing::debug!(strategy = strategy.name(), len = text.len(), "Extracted reply text");
            Some(text)
        })
    }

    /// Returns display text, substituting a fallback sentence when needed.
    pub fn extract(&self, result: &Value) -> String {
        match self.try_extract(result) {
            Ok(Some(text)) => text,
            Ok(None) => not_understood(result.as_object()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to extract reply text");
                PROCESSING_ERROR.to_string()
            }
        }
    }

    /// Same as [`ResponseExtractor::extract`] for an already-typed result.
    pub fn extract_result(&self, result: &AggregatedResult) -> String {
        self.first_match(result.fields())
            .unwrap_or_else(|| not_understood(Some(result.fields())))
    }
}

/// Extracts display text with the default strategy order.
pub fn extract_response_text(result: &Value) -> String {
    ResponseExtractor::default().extract(result)
}

fn not_understood(fields: Option<&Map<String, Value>>) -> String {
    let keys: Vec<&str> = fields
        .map(|m| m.keys().map(String::as_str).collect())
        .unwrap_or_default();
    tracing::warn!(?keys, "No known reply shape in provider result");
    NOT_UNDERSTOOD.to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
