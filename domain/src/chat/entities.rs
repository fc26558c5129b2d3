//! Chat aggregate: ordered turn history bounded by the model's token budget.
//!
//! # Eviction
//!
//! [`Chat::add_message`] keeps `token_usage <= model.max_tokens()` by moving
//! the oldest turns, regardless of role, from `messages` to
//! `erased_messages` until the incoming turn fits:
//!
//! ```text
//! budget 50, usage 30: [system(10), user(20)]  + user(25)
//!   30 + 25 > 50  -> evict system(10)          usage 20
//!   20 + 25 <= 50 -> append                    usage 45
//! messages = [user(20), user(25)], erased = [system(10)]
//! ```
//!
//! A turn that exceeds the budget on its own is rejected up front with
//! [`DomainError::MessageTooLarge`]; it never drains the history.

use super::config::ChatConfig;
use super::message::Message;
use super::value_objects::{ChatId, ChatStatus};
use crate::core::error::{DomainError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Result of a successful [`Chat::add_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddOutcome {
    /// Number of turns moved to the erased log to make room.
    pub evicted: usize,
}

/// A conversation with a single model (Aggregate Root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    id: ChatId,
    user_id: String,
    initial_system_message: Message,
    messages: VecDeque<Message>,
    erased_messages: Vec<Message>,
    status: ChatStatus,
    token_usage: usize,
    config: ChatConfig,
}

impl Chat {
    /// Create a chat with a freshly generated id.
    pub fn new(
        user_id: impl Into<String>,
        initial_system_message: Message,
        config: ChatConfig,
    ) -> Result<Self, DomainError> {
        Self::with_id(ChatId::generate(), user_id, initial_system_message, config)
    }

    /// Create a chat under a caller-chosen id.
    ///
    /// The chat starts `Active` with zero usage and immediately appends the
    /// initial system message.
    pub fn with_id(
        id: ChatId,
        user_id: impl Into<String>,
        initial_system_message: Message,
        config: ChatConfig,
    ) -> Result<Self, DomainError> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }
        config.validate()?;

        let mut chat = Self {
            id,
            user_id,
            initial_system_message: initial_system_message.clone(),
            messages: VecDeque::new(),
            erased_messages: Vec::new(),
            status: ChatStatus::Active,
            token_usage: 0,
            config,
        };
        chat.add_message(initial_system_message)?;
        Ok(chat)
    }

    /// Append a turn, evicting the oldest turns until it fits the budget.
    pub fn add_message(&mut self, message: Message) -> Result<AddOutcome, DomainError> {
        if self.status == ChatStatus::Ended {
            return Err(DomainError::ChatEnded);
        }

        let max_tokens = self.config.model().max_tokens();
        let incoming = message.token_count();
        if incoming > max_tokens {
            return Err(DomainError::MessageTooLarge {
                tokens: incoming,
                max_tokens,
            });
        }

        let mut evicted = 0;
        while max_tokens < self.token_usage + incoming {
            // Cannot be empty here: usage would be 0 and incoming <= max_tokens.
            let Some(oldest) = self.messages.pop_front() else {
                break;
            };
            self.token_usage -= oldest.token_count();
            self.erased_messages.push(oldest);
            evicted += 1;
        }

        self.token_usage += incoming;
        self.messages.push_back(message);
        debug_assert_eq!(self.token_usage, self.recount_usage());

        Ok(AddOutcome { evicted })
    }

    /// Mark the chat as ended. Irreversible and idempotent.
    pub fn end(&mut self) {
        self.status = ChatStatus::Ended;
    }

    // ==================== Projections ====================

    pub fn id(&self) -> &ChatId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn initial_system_message(&self) -> &Message {
        &self.initial_system_message
    }

    /// Current window, oldest first.
    pub fn messages(&self) -> impl ExactSizeIterator<Item = &Message> + DoubleEndedIterator {
        self.messages.iter()
    }

    pub fn count_messages(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Evicted turns, in the order they left the window.
    pub fn erased_messages(&self) -> &[Message] {
        &self.erased_messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.status == ChatStatus::Ended
    }

    pub fn token_usage(&self) -> usize {
        self.token_usage
    }

    /// Tokens still available before the next turn forces an eviction.
    pub fn remaining_tokens(&self) -> usize {
        self.config
            .model()
            .max_tokens()
            .saturating_sub(self.token_usage)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    // ==================== Validation ====================

    /// Re-check the aggregate invariants, e.g. after loading from storage.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        if self.user_id.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        self.config.validate()?;

        let actual = self.recount_usage();
        if actual != self.token_usage {
            return Err(ValidationError::InconsistentState(format!(
                "token usage is {} but messages sum to {}",
                self.token_usage, actual
            )));
        }
        let max_tokens = self.config.model().max_tokens();
        if self.token_usage > max_tokens {
            return Err(ValidationError::InconsistentState(format!(
                "token usage {} exceeds budget {}",
                self.token_usage, max_tokens
            )));
        }
        if self
            .messages
            .iter()
            .zip(self.messages.iter().skip(1))
            .any(|(a, b)| a.created_at() > b.created_at())
        {
            return Err(ValidationError::InconsistentState(
                "messages are not in chronological order".to_string(),
            ));
        }
        Ok(())
    }

    fn recount_usage(&self) -> usize {
        self.messages.iter().map(Message::token_count).sum()
    }
}
