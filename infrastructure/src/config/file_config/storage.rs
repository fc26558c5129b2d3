//! Storage configuration from TOML (`[storage]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which chat store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
}

impl StorageBackend {
    const VALID: [&'static str; 2] = ["memory", "file"];
}

/// # Example
///
/// ```toml
/// [storage]
/// backend = "file"
/// dir = "~/.local/share/chat-service/chats"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// "memory" or "file"
    pub backend: String,
    /// Chat directory for the file backend; defaults to the platform data dir.
    pub dir: Option<PathBuf>,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            dir: None,
        }
    }
}

impl FileStorageConfig {
    pub fn parse_backend(&self) -> (StorageBackend, Vec<ConfigIssue>) {
        match self.backend.to_lowercase().as_str() {
            "memory" => (StorageBackend::Memory, Vec::new()),
            "file" => (StorageBackend::File, Vec::new()),
            other => (
                StorageBackend::File,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "storage.backend".to_string(),
                        value: other.to_string(),
                        valid_values: StorageBackend::VALID.iter().map(|s| s.to_string()).collect(),
                    },
                    format!("storage.backend: unknown value '{}', falling back to 'file'", other),
                )],
            ),
        }
    }

    /// Directory for the file backend.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("chat-service").join("chats")))
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (backend, mut issues) = self.parse_backend();
        if backend == StorageBackend::File && self.resolved_dir().is_none() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingStorageDir,
                "storage.dir: no directory configured and no platform data dir available",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_is_case_insensitive() {
        let config = FileStorageConfig {
            backend: "Memory".into(),
            dir: None,
        };
        assert_eq!(config.parse_backend().0, StorageBackend::Memory);
    }

    #[test]
    fn test_unknown_backend_warns() {
        let config = FileStorageConfig {
            backend: "redis".into(),
            dir: None,
        };
        let (backend, issues) = config.parse_backend();
        assert_eq!(backend, StorageBackend::File);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_explicit_dir_wins() {
        let config = FileStorageConfig {
            backend: "file".into(),
            dir: Some(PathBuf::from("/tmp/chats")),
        };
        assert_eq!(config.resolved_dir(), Some(PathBuf::from("/tmp/chats")));
    }
}
