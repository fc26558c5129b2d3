//! Model configuration from TOML (`[model]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use chat_service_domain::{DEFAULT_CONTEXT_TOKENS, Model};
use serde::{Deserialize, Serialize};

/// How message token counts are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// Exact BPE counts for OpenAI model families.
    Bpe,
    /// Character-ratio estimate.
    Heuristic,
}

impl TokenizerKind {
    const VALID: [&'static str; 2] = ["bpe", "heuristic"];
}

/// Model used for new chats.
///
/// # Example
///
/// ```toml
/// [model]
/// name = "gpt-4o"
/// max_tokens = 128000   # omit to use the model family's context window
/// tokenizer = "bpe"      # or "heuristic"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub name: String,
    /// Context-token budget; `None` resolves from the model family.
    pub max_tokens: Option<usize>,
    /// "bpe" or "heuristic"
    pub tokenizer: String,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            name: chat_service_application::config::DEFAULT_MODEL.to_string(),
            max_tokens: None,
            tokenizer: "bpe".to_string(),
        }
    }
}

impl FileModelConfig {
    /// Effective context budget, falling back to the family default.
    pub fn resolved_max_tokens(&self) -> usize {
        self.max_tokens
            .or_else(|| Model::known_context_window(&self.name))
            .unwrap_or(DEFAULT_CONTEXT_TOKENS)
    }

    pub fn parse_tokenizer(&self) -> (TokenizerKind, Vec<ConfigIssue>) {
        match self.tokenizer.to_lowercase().as_str() {
            "bpe" => (TokenizerKind::Bpe, Vec::new()),
            "heuristic" => (TokenizerKind::Heuristic, Vec::new()),
            other => (
                TokenizerKind::Bpe,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "model.tokenizer".to_string(),
                        value: other.to_string(),
                        valid_values: TokenizerKind::VALID.iter().map(|s| s.to_string()).collect(),
                    },
                    format!("model.tokenizer: unknown value '{}', falling back to 'bpe'", other),
                )],
            ),
        }
    }

    /// Build the domain model, collecting issues.
    pub fn to_model(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        let (_, mut issues) = self.parse_tokenizer();

        if self.name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelName,
                "model.name: model name cannot be empty",
            ));
            return (None, issues);
        }
        if self.max_tokens == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroMaxTokens,
                "model.max_tokens: must be greater than 0",
            ));
            return (None, issues);
        }
        if self.max_tokens.is_none() && Model::known_context_window(&self.name).is_none() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::UnknownModelContext {
                    model: self.name.clone(),
                },
                format!(
                    "model.max_tokens: unknown context window for '{}', using {}",
                    self.name, DEFAULT_CONTEXT_TOKENS
                ),
            ));
        }

        let model = Model::new(self.name.clone(), self.resolved_max_tokens()).ok();
        (model, issues)
    }
}
