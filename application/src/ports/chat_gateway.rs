//! Chat Gateway port
//!
//! Persistence contract for the [`Chat`] aggregate.

use async_trait::async_trait;
use chat_service_domain::{Chat, ChatId};
use thiserror::Error;

/// Errors that can occur during chat persistence
#[derive(Error, Debug)]
pub enum ChatGatewayError {
    #[error("chat not found: {0}")]
    NotFound(ChatId),

    #[error("chat already exists: {0}")]
    AlreadyExists(ChatId),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("stored chat {id} is corrupt: {reason}")]
    Corrupt { id: ChatId, reason: String },
}

impl ChatGatewayError {
    /// True when the lookup failed only because the chat does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatGatewayError::NotFound(_))
    }
}

/// Storage for chats
///
/// Implementations (adapters) live in the infrastructure layer.
/// `find_chat_by_id` must return [`ChatGatewayError::NotFound`] for a missing
/// chat so callers can tell "absent" apart from a storage failure.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Persist a chat for the first time.
    async fn create_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError>;

    /// Load a chat by id.
    async fn find_chat_by_id(&self, id: &ChatId) -> Result<Chat, ChatGatewayError>;

    /// Persist the current state of an existing chat.
    async fn save_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError>;
}
