//! OpenAI-compatible completion provider.
//!
//! Implements the [`LlmGateway`](chat_service_application::LlmGateway) port
//! over HTTP with Server-Sent Events. Works with OpenAI itself and with any
//! server exposing the same `/chat/completions` streaming API.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod sse;

pub use error::OpenAiError;
pub use gateway::{OpenAiCompatConfig, OpenAiCompatGateway};
