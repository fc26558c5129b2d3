//! Application layer for chat-service
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatCompletionConfig, StreamingParams};
pub use ports::{
    chat_gateway::{ChatGateway, ChatGatewayError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{CompletionRequest, GatewayError, LlmGateway, PromptMessage, StreamHandle},
};
pub use use_cases::chat_completion_stream::{
    ChatCompletionError, ChatCompletionInput, ChatCompletionOutput, ChatCompletionStreamUseCase,
    TurnHandle,
};
pub use use_cases::end_chat::{EndChatError, EndChatUseCase};
pub use use_cases::session_locks::SessionLocks;
