//! Domain layer for chat-service
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Chat
//!
//! A [`Chat`] holds an ordered window of turns whose summed token counts
//! never exceed the model's context budget. When a new turn does not fit,
//! the oldest turns are evicted into an append-only erased log.
//!
//! ## Token budget
//!
//! Every [`Message`] counts its tokens once, at creation, through a
//! [`Tokenizer`] for the chat's [`Model`].

pub mod chat;
pub mod core;

// Re-export commonly used types
pub use chat::{
    config::{ChatConfig, SamplingParams, TEMPERATURE_RANGE},
    entities::{AddOutcome, Chat},
    message::Message,
    stream::StreamEvent,
    value_objects::{ChatId, ChatStatus, MessageId, Role},
};
pub use core::{
    error::{DomainError, ValidationError},
    model::{DEFAULT_CONTEXT_TOKENS, Model},
    tokenizer::Tokenizer,
};
