//! Application-level configuration.
//!
//! - [`ChatCompletionConfig`]: model, budget, sampling and system prompt for new chats
//! - [`StreamingParams`]: output channel control

pub mod chat_defaults;
pub mod streaming_params;

pub use chat_defaults::{ChatCompletionConfig, DEFAULT_MODEL, DEFAULT_SYSTEM_MESSAGE};
pub use streaming_params::StreamingParams;
