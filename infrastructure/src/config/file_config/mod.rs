//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is optional; missing keys take their defaults.

mod chat;
mod logging;
mod model;
mod provider;
mod storage;

pub use chat::FileChatConfig;
pub use logging::FileLoggingConfig;
pub use model::{FileModelConfig, TokenizerKind};
pub use provider::FileProviderConfig;
pub use storage::{FileStorageConfig, StorageBackend};

use super::issue::ConfigIssue;
use chat_service_application::ChatCompletionConfig;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model and context budget for new chats
    pub model: FileModelConfig,
    /// System prompt and sampling parameters
    pub chat: FileChatConfig,
    /// Completion endpoint
    pub provider: FileProviderConfig,
    /// Chat store
    pub storage: FileStorageConfig,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.model.to_model().1);
        issues.extend(self.chat.validate());
        issues.extend(self.provider.validate());
        issues.extend(self.storage.validate());
        issues
    }

    /// Configuration used when a turn has to create its chat.
    pub fn to_completion_config(&self) -> ChatCompletionConfig {
        ChatCompletionConfig::default()
            .with_model(self.model.name.clone(), self.model.resolved_max_tokens())
            .with_sampling(self.chat.to_sampling())
            .with_system_message(self.chat.system_message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::issue::ConfigIssueCode;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[model]
name = "gpt-4"
max_tokens = 8000
tokenizer = "heuristic"

[chat]
system_message = "Answer in French."
temperature = 0.4
stop = ["END"]

[provider]
base_url = "http://localhost:8080/v1"

[storage]
backend = "memory"

[logging]
conversation_log = "/tmp/chat.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.name, "gpt-4");
        assert_eq!(config.model.max_tokens, Some(8000));
        assert_eq!(config.model.parse_tokenizer().0, TokenizerKind::Heuristic);
        assert_eq!(config.chat.temperature, 0.4);
        assert_eq!(config.chat.stop, vec!["END".to_string()]);
        assert_eq!(config.provider.base_url, "http://localhost:8080/v1");
        assert_eq!(config.storage.parse_backend().0, StorageBackend::Memory);
        assert!(config.logging.conversation_log.is_some());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[chat]
temperature = 0.1
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chat.temperature, 0.1);
        // Defaults should apply
        assert_eq!(config.model, FileModelConfig::default());
        assert_eq!(config.provider.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut config = FileConfig::default();
        config.model.name = String::new();
        config.chat.temperature = -1.0;
        config.provider.request_timeout_secs = 0;

        let codes: Vec<ConfigIssueCode> = config.validate().into_iter().map(|i| i.code).collect();
        assert!(codes.contains(&ConfigIssueCode::EmptyModelName));
        assert!(codes.contains(&ConfigIssueCode::TemperatureOutOfRange));
        assert!(codes.contains(&ConfigIssueCode::ZeroRequestTimeout));
    }

    #[test]
    fn test_to_completion_config() {
        let mut config = FileConfig::default();
        config.model.name = "claude-3-haiku".into();
        config.chat.system_message = "Be brief.".into();
        config.chat.temperature = 0.5;

        let completion = config.to_completion_config();
        assert_eq!(completion.model, "claude-3-haiku");
        assert_eq!(completion.model_max_tokens, 200_000);
        assert_eq!(completion.initial_system_message, "Be brief.");
        assert_eq!(completion.sampling.temperature, 0.5);
    }
}
