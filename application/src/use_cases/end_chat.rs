//! End chat use case.
//!
//! Moves a persisted chat to its terminal state. Ending an already ended
//! chat succeeds without writing.

use crate::ports::chat_gateway::{ChatGateway, ChatGatewayError};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::use_cases::session_locks::SessionLocks;
use chat_service_domain::{Chat, ChatId};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum EndChatError {
    #[error("chat not found: {0}")]
    NotFound(ChatId),

    #[error("error fetching chat: {0}")]
    FetchChat(ChatGatewayError),

    #[error("error saving chat: {0}")]
    SaveChat(ChatGatewayError),
}

pub struct EndChatUseCase {
    chats: Arc<dyn ChatGateway>,
    conversation_logger: Arc<dyn ConversationLogger>,
    session_locks: SessionLocks,
}

impl EndChatUseCase {
    pub fn new(chats: Arc<dyn ChatGateway>) -> Self {
        Self {
            chats,
            conversation_logger: Arc::new(NoConversationLogger),
            session_locks: SessionLocks::new(),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Share the lock registry of the turn use case so an end never
    /// interleaves with a running turn.
    pub fn with_session_locks(mut self, locks: SessionLocks) -> Self {
        self.session_locks = locks;
        self
    }

    pub async fn execute(&self, chat_id: &ChatId) -> Result<Chat, EndChatError> {
        let _session = self.session_locks.acquire(chat_id).await;

        let mut chat = self.chats.find_chat_by_id(chat_id).await.map_err(|e| {
            if e.is_not_found() {
                EndChatError::NotFound(chat_id.clone())
            } else {
                EndChatError::FetchChat(e)
            }
        })?;

        if chat.is_ended() {
            info!(chat_id = %chat_id, "Chat already ended");
            return Ok(chat);
        }

        chat.end();
        self.chats
            .save_chat(&chat)
            .await
            .map_err(EndChatError::SaveChat)?;

        info!(chat_id = %chat_id, messages = chat.count_messages(), "Chat ended");
        self.conversation_logger.log(ConversationEvent::new(
            "chat_ended",
            serde_json::json!({
                "chat_id": chat_id.as_str(),
                "messages": chat.count_messages(),
                "erased": chat.erased_messages().len(),
                "token_usage": chat.token_usage(),
            }),
        ));
        Ok(chat)
    }
}
