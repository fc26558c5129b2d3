//! Error types for the OpenAI-compatible adapter

use chat_service_application::ports::llm_gateway::GatewayError;
use thiserror::Error;

/// Errors that can occur when talking to an OpenAI-compatible endpoint
#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse stream chunk: {error}\nRaw chunk: {raw}")]
    Parse { error: String, raw: String },

    #[error("Stream read error: {0}")]
    Stream(String),

    #[error("Stream is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Request timeout")]
    Timeout,
}

impl From<OpenAiError> for GatewayError {
    fn from(e: OpenAiError) -> Self {
        match e {
            OpenAiError::Timeout => GatewayError::Timeout,
            OpenAiError::Http(err) if err.is_timeout() => GatewayError::Timeout,
            OpenAiError::Http(err) if err.is_connect() => {
                GatewayError::ConnectionError(err.to_string())
            }
            OpenAiError::Api { status, message } => match status {
                401 | 403 => GatewayError::Unauthorized(message),
                404 => GatewayError::ModelNotAvailable(message),
                _ => GatewayError::RequestFailed(format!("status {}: {}", status, message)),
            },
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}
