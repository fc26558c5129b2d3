//! Configuration file loading for chat-service
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CHAT_SERVICE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./chat-service.toml` or `./.chat-service.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/chat-service/config.toml`
//! 5. Default values

mod file_config;
mod issue;
mod loader;

pub use file_config::{
    FileChatConfig, FileConfig, FileLoggingConfig, FileModelConfig, FileProviderConfig,
    FileStorageConfig, StorageBackend, TokenizerKind,
};
pub use issue::{ConfigIssue, ConfigIssueCode, Severity};
pub use loader::{ConfigLoader, ENV_PREFIX};
