//! LLM Gateway port
//!
//! Defines the interface for streaming chat completions from a provider.

use async_trait::async_trait;
use chat_service_domain::{Chat, Role, SamplingParams, StreamEvent};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Timeout")]
    Timeout,
}

/// One turn of the prompt sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

/// A streaming completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name as the provider knows it.
    pub model: String,
    /// Current window of the chat, oldest first.
    pub messages: Vec<PromptMessage>,
    pub sampling: SamplingParams,
}

impl CompletionRequest {
    /// Build the request from the chat's current window and stored config.
    pub fn from_chat(chat: &Chat) -> Self {
        let config = chat.config();
        Self {
            model: config.model().name().to_string(),
            messages: chat
                .messages()
                .map(|m| PromptMessage {
                    role: m.role(),
                    content: m.content().to_string(),
                })
                .collect(),
            sampling: config.sampling().clone(),
        }
    }
}

/// Gateway for LLM communication
///
/// Implementations (adapters) live in the infrastructure layer. A
/// successful call returns a [`StreamHandle`] whose channel yields zero or
/// more [`StreamEvent::Delta`] fragments followed by exactly one terminal
/// event (`Completed` or `Error`).
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamHandle, GatewayError>;
}

/// Handle for receiving streaming events from a provider.
///
/// Wraps the `mpsc::Receiver<StreamEvent>` an adapter feeds from its
/// reader task.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }
}
