//! Per-turn chat configuration supplied by the caller.
//!
//! [`ChatCompletionConfig`] carries everything needed to create a brand-new
//! chat when the requested session does not exist yet: the model, its
//! context budget, sampling parameters, and the initial system message.
//! For an existing session only the stored chat configuration is used.

use chat_service_domain::{ChatConfig, Model, SamplingParams, ValidationError};
use serde::{Deserialize, Serialize};

/// Default system prompt for new chats.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Default model for new chats.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration used to create a chat on first contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionConfig {
    /// Model identifier sent to the completion provider.
    pub model: String,
    /// Context-token budget of the model (eviction threshold).
    pub model_max_tokens: usize,
    /// Sampling parameters forwarded with every request.
    pub sampling: SamplingParams,
    /// First turn of every new chat.
    pub initial_system_message: String,
}

impl Default for ChatCompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            model_max_tokens: Model::known_context_window(DEFAULT_MODEL)
                .unwrap_or(chat_service_domain::DEFAULT_CONTEXT_TOKENS),
            sampling: SamplingParams::default(),
            initial_system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
        }
    }
}

impl ChatCompletionConfig {
    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: impl Into<String>, max_tokens: usize) -> Self {
        self.model = model.into();
        self.model_max_tokens = max_tokens;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.sampling.temperature = temperature;
        self
    }

    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.initial_system_message = message.into();
        self
    }

    // ==================== Conversion ====================

    /// Build the domain [`ChatConfig`] (validates the model).
    pub fn to_chat_config(&self) -> Result<ChatConfig, ValidationError> {
        let model = Model::new(self.model.clone(), self.model_max_tokens)?;
        Ok(ChatConfig::new(model).with_sampling(self.sampling.clone()))
    }
}
