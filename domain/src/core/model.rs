//! Model value object representing an LLM model and its context budget

use super::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Context window assumed for model names no family rule recognises.
pub const DEFAULT_CONTEXT_TOKENS: usize = 4_096;

/// Known model families and their context windows, checked in order (longest prefix first).
const KNOWN_CONTEXT_WINDOWS: &[(&str, usize)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4.1", 1_047_576),
    ("gpt-4-turbo", 128_000),
    ("gpt-4-32k", 32_768),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo-16k", 16_385),
    ("gpt-3.5-turbo", 16_385),
    ("claude", 200_000),
];

/// An LLM model together with its maximum context-token budget (Value Object)
///
/// Immutable after construction. Every message of a chat and the chat's
/// configuration share the same model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Model {
    name: String,
    max_tokens: usize,
}

impl Model {
    /// Create a model, rejecting an empty name or a zero budget.
    pub fn new(name: impl Into<String>, max_tokens: usize) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyModelName);
        }
        if max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens { model: name });
        }
        Ok(Self { name, max_tokens })
    }

    /// Create a model whose budget is the known context window of its family.
    pub fn with_known_context(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let max_tokens = Self::known_context_window(&name).unwrap_or(DEFAULT_CONTEXT_TOKENS);
        Self::new(name, max_tokens)
    }

    /// Look up the context window for a well-known model family.
    pub fn known_context_window(name: &str) -> Option<usize> {
        KNOWN_CONTEXT_WINDOWS
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, tokens)| *tokens)
    }

    /// Get the model identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the maximum number of context tokens
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Check the construction invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), ValidationError> {
        Self::new(self.name.clone(), self.max_tokens).map(|_| ())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
