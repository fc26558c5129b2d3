//! One JSON document per chat under a directory.
//!
//! Layout: `{dir}/{chat_id}.json`, pretty-printed. Saves go through a
//! temporary file and a rename so a crash never leaves a half-written chat.

use async_trait::async_trait;
use chat_service_application::ports::chat_gateway::{ChatGateway, ChatGatewayError};
use chat_service_domain::{Chat, ChatId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// File-backed [`ChatGateway`].
pub struct JsonFileChatGateway {
    dir: PathBuf,
}

impl JsonFileChatGateway {
    /// Use `dir` as the chat directory, creating it if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, ChatGatewayError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ChatId) -> Result<PathBuf, ChatGatewayError> {
        let name = id.as_str();
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(ChatGatewayError::Storage(format!(
                "chat id '{}' cannot be used as a file name",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    fn encode(chat: &Chat) -> Result<Vec<u8>, ChatGatewayError> {
        serde_json::to_vec_pretty(chat)
            .map_err(|e| ChatGatewayError::Storage(format!("failed to encode chat: {}", e)))
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> ChatGatewayError {
    ChatGatewayError::Storage(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl ChatGateway for JsonFileChatGateway {
    async fn create_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError> {
        let path = self.path_for(chat.id())?;
        let bytes = Self::encode(chat)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ChatGatewayError::AlreadyExists(chat.id().clone()),
                _ => storage_error(&path, e),
            })?;
        file.write_all(&bytes)
            .await
            .map_err(|e| storage_error(&path, e))?;
        file.flush().await.map_err(|e| storage_error(&path, e))?;

        debug!(chat_id = %chat.id(), path = %path.display(), "Created chat file");
        Ok(())
    }

    async fn find_chat_by_id(&self, id: &ChatId) -> Result<Chat, ChatGatewayError> {
        let path = self.path_for(id)?;
        let bytes = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ChatGatewayError::NotFound(id.clone()),
            _ => storage_error(&path, e),
        })?;

        let chat: Chat = serde_json::from_slice(&bytes).map_err(|e| ChatGatewayError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        chat.check_invariants()
            .map_err(|e| ChatGatewayError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;
        if chat.id() != id {
            return Err(ChatGatewayError::Corrupt {
                id: id.clone(),
                reason: format!("file holds chat {}", chat.id()),
            });
        }
        Ok(chat)
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError> {
        let path = self.path_for(chat.id())?;
        let tmp = path.with_extension("json.tmp");
        let bytes = Self::encode(chat)?;

        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(&path, e))?;

        debug!(chat_id = %chat.id(), bytes = bytes.len(), "Saved chat file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::sample_chat;

    async fn gateway() -> (tempfile::TempDir, JsonFileChatGateway) {
        let dir = tempfile::tempdir().unwrap();
        let gateway = JsonFileChatGateway::new(dir.path().join("chats"))
            .await
            .unwrap();
        (dir, gateway)
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let (_dir, gateway) = gateway().await;
        let chat = sample_chat("c1");

        gateway.create_chat(&chat).await.unwrap();
        let loaded = gateway.find_chat_by_id(chat.id()).await.unwrap();

        assert_eq!(loaded, chat);
        assert!(gateway.dir().join("c1.json").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, gateway) = gateway().await;
        let err = gateway
            .find_chat_by_id(&ChatId::new("ghost"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected() {
        let (_dir, gateway) = gateway().await;
        let chat = sample_chat("c1");
        gateway.create_chat(&chat).await.unwrap();

        let err = gateway.create_chat(&chat).await.unwrap_err();
        assert!(matches!(err, ChatGatewayError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_save_overwrites_and_leaves_no_temp_file() {
        let (_dir, gateway) = gateway().await;
        let mut chat = sample_chat("c1");
        gateway.create_chat(&chat).await.unwrap();

        chat.end();
        gateway.save_chat(&chat).await.unwrap();

        assert!(gateway.find_chat_by_id(chat.id()).await.unwrap().is_ended());
        assert!(!gateway.dir().join("c1.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_garbage_file_is_corrupt() {
        let (_dir, gateway) = gateway().await;
        std::fs::write(gateway.dir().join("bad.json"), "{ not json").unwrap();

        let err = gateway
            .find_chat_by_id(&ChatId::new("bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatGatewayError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_tampered_usage_is_corrupt() {
        let (_dir, gateway) = gateway().await;
        let chat = sample_chat("c1");
        gateway.create_chat(&chat).await.unwrap();

        let path = gateway.dir().join("c1.json");
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["token_usage"] = serde_json::json!(9999);
        std::fs::write(&path, value.to_string()).unwrap();

        let err = gateway.find_chat_by_id(chat.id()).await.unwrap_err();
        assert!(matches!(err, ChatGatewayError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_path_traversal_ids_are_rejected() {
        let (_dir, gateway) = gateway().await;
        for id in ["../escape", "..", "a/b"] {
            let err = gateway.find_chat_by_id(&ChatId::new(id)).await.unwrap_err();
            assert!(matches!(err, ChatGatewayError::Storage(_)), "id {id}");
        }
    }
}
