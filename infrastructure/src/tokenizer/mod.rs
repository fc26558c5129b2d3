//! Tokenizer adapters implementing the domain [`Tokenizer`](chat_service_domain::Tokenizer) trait.

mod bpe;
mod heuristic;

pub use bpe::BpeTokenizer;
pub use heuristic::{HeuristicTokenizer, MESSAGE_OVERHEAD_TOKENS};
