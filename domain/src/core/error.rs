//! Domain error types

use thiserror::Error;

/// Construction-time validation failures for value objects and the Chat aggregate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("content is empty")]
    EmptyContent,

    #[error("user id is empty")]
    EmptyUserId,

    #[error("invalid temperature: {0} (must be within [0, 2])")]
    InvalidTemperature(f32),

    #[error("model name is empty")]
    EmptyModelName,

    #[error("invalid max tokens for model {model}: must be greater than zero")]
    InvalidMaxTokens { model: String },

    #[error("inconsistent chat state: {0}")]
    InconsistentState(String),
}

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("chat is ended. No more messages allowed")]
    ChatEnded,

    #[error("message needs {tokens} tokens but the model budget is {max_tokens}")]
    MessageTooLarge { tokens: usize, max_tokens: usize },
}

impl DomainError {
    /// Check if this error represents an attempt to write to an ended chat
    pub fn is_chat_ended(&self) -> bool {
        matches!(self, DomainError::ChatEnded)
    }

    /// Check if this error is a construction-time validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }
}
