//! Core domain concepts shared across the chat subdomain.
//!
//! - [`model::Model`]: a model identifier and its context-token budget
//! - [`tokenizer::Tokenizer`]: model-aware token counting
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod tokenizer;
