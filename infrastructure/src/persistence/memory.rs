//! In-memory chat store.

use async_trait::async_trait;
use chat_service_application::ports::chat_gateway::{ChatGateway, ChatGatewayError};
use chat_service_domain::{Chat, ChatId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local [`ChatGateway`]; chats are lost on exit.
#[derive(Default)]
pub struct InMemoryChatGateway {
    chats: RwLock<HashMap<ChatId, Chat>>,
}

impl InMemoryChatGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }
}

#[async_trait]
impl ChatGateway for InMemoryChatGateway {
    async fn create_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError> {
        let mut chats = self.chats.write().await;
        if chats.contains_key(chat.id()) {
            return Err(ChatGatewayError::AlreadyExists(chat.id().clone()));
        }
        chats.insert(chat.id().clone(), chat.clone());
        Ok(())
    }

    async fn find_chat_by_id(&self, id: &ChatId) -> Result<Chat, ChatGatewayError> {
        self.chats
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ChatGatewayError::NotFound(id.clone()))
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError> {
        self.chats
            .write()
            .await
            .insert(chat.id().clone(), chat.clone());
        Ok(())
    }
}
