//! Message entity: one immutable turn of a conversation

use super::value_objects::{MessageId, Role};
use crate::core::error::ValidationError;
use crate::core::model::Model;
use crate::core::tokenizer::Tokenizer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single turn in a chat (Entity)
///
/// The token count is computed once, at construction, against the model of
/// the owning chat and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    token_count: usize,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message, counting its tokens for `model`.
    pub fn new(
        role: Role,
        content: impl Into<String>,
        model: &Model,
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        let token_count = tokenizer.count(model.name(), &content);
        Ok(Self {
            id: MessageId::generate(),
            role,
            content,
            token_count,
            created_at: Utc::now(),
        })
    }

    /// Create a message from a raw role string (e.g. from a wire format).
    ///
    /// Fails with [`ValidationError::InvalidRole`] for anything outside
    /// `system`, `user` and `assistant`.
    pub fn parse_role(
        role: &str,
        content: impl Into<String>,
        model: &Model,
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self, ValidationError> {
        let role: Role = role.parse()?;
        Self::new(role, content, model, tokenizer)
    }

    pub fn system(
        content: impl Into<String>,
        model: &Model,
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self, ValidationError> {
        Self::new(Role::System, content, model, tokenizer)
    }

    pub fn user(
        content: impl Into<String>,
        model: &Model,
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self, ValidationError> {
        Self::new(Role::User, content, model, tokenizer)
    }

    pub fn assistant(
        content: impl Into<String>,
        model: &Model,
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self, ValidationError> {
        Self::new(Role::Assistant, content, model, tokenizer)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Tokenizer that counts whitespace-separated words.
    pub(crate) struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn count(&self, _model_name: &str, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    /// Build content that [`WordTokenizer`] counts as exactly `tokens` tokens.
    pub(crate) fn words(tokens: usize) -> String {
        vec!["w"; tokens].join(" ")
    }

    pub(crate) fn message(role: Role, tokens: usize, model: &Model) -> Message {
        Message::new(role, words(tokens), model, &WordTokenizer).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    /// Tokenizer that records which model it was asked about.
    struct ModelEchoTokenizer;

    impl Tokenizer for ModelEchoTokenizer {
        fn count(&self, model_name: &str, _text: &str) -> usize {
            model_name.len()
        }
    }

    fn model() -> Model {
        Model::new("gpt-4o", 100).unwrap()
    }

    #[test]
    fn test_message_counts_tokens_at_creation() {
        let message = Message::user("one two three", &model(), &WordTokenizer).unwrap();
        assert_eq!(message.role(), Role::User);
        assert_eq!(message.content(), "one two three");
        assert_eq!(message.token_count(), 3);
        assert!(!message.id().as_str().is_empty());
    }

    #[test]
    fn test_message_counts_against_owning_model() {
        let message = Message::system("hi", &model(), &ModelEchoTokenizer).unwrap();
        assert_eq!(message.token_count(), "gpt-4o".len());
    }

    #[test]
    fn test_message_rejects_empty_content() {
        let result = Message::assistant("", &model(), &WordTokenizer);
        assert_eq!(result, Err(ValidationError::EmptyContent));
    }

    #[test]
    fn test_message_rejects_unknown_role() {
        let result = Message::parse_role("assystant", "hello", &model(), &WordTokenizer);
        assert_eq!(
            result,
            Err(ValidationError::InvalidRole("assystant".to_string()))
        );
    }

    #[test]
    fn test_message_parse_role_accepts_whitelist() {
        for role in ["system", "user", "assistant"] {
            let message = Message::parse_role(role, "hello", &model(), &WordTokenizer).unwrap();
            assert_eq!(message.role().as_str(), role);
        }
    }

    #[test]
    fn test_whitespace_only_content_is_allowed() {
        // Only the empty string is rejected; whitespace counts as content.
        let message = Message::user("  ", &model(), &WordTokenizer).unwrap();
        assert_eq!(message.token_count(), 0);
    }

    #[test]
    fn test_each_message_gets_fresh_id() {
        let a = message(Role::User, 1, &model());
        let b = message(Role::User, 1, &model());
        assert_ne!(a.id(), b.id());
    }
}
