//! Infrastructure layer for chat-service
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod openai;
pub mod persistence;
pub mod tokenizer;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigIssueCode, ConfigLoader, FileChatConfig, FileConfig, FileLoggingConfig,
    FileModelConfig, FileProviderConfig, FileStorageConfig, Severity, StorageBackend,
    TokenizerKind,
};
pub use logging::JsonlConversationLogger;
pub use openai::{OpenAiCompatConfig, OpenAiCompatGateway, OpenAiError};
pub use persistence::{InMemoryChatGateway, JsonFileChatGateway};
pub use tokenizer::{BpeTokenizer, HeuristicTokenizer};
