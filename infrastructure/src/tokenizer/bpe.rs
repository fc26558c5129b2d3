//! Exact token counts for OpenAI model families.
//!
//! Encodings are resolved from the model name and cached. Models the
//! encoder tables do not know are counted by [`HeuristicTokenizer`].

use super::heuristic::{HeuristicTokenizer, MESSAGE_OVERHEAD_TOKENS};
use chat_service_domain::Tokenizer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// BPE-backed tokenizer with a heuristic fallback.
pub struct BpeTokenizer {
    message_overhead: usize,
    fallback: HeuristicTokenizer,
    /// `None` marks a model with no known encoding.
    encoders: Mutex<HashMap<String, Option<Arc<CoreBPE>>>>,
}

impl Default for BpeTokenizer {
    fn default() -> Self {
        Self {
            message_overhead: MESSAGE_OVERHEAD_TOKENS,
            fallback: HeuristicTokenizer::new(),
            encoders: Mutex::new(HashMap::new()),
        }
    }
}

impl BpeTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_overhead(mut self, overhead: usize) -> Self {
        self.message_overhead = overhead;
        self.fallback = self.fallback.with_message_overhead(overhead);
        self
    }

    fn encoder(&self, model_name: &str) -> Option<Arc<CoreBPE>> {
        let mut encoders = self.encoders.lock().unwrap_or_else(PoisonError::into_inner);
        encoders
            .entry(model_name.to_string())
            .or_insert_with(|| match tiktoken_rs::get_bpe_from_model(model_name) {
                Ok(bpe) => Some(Arc::new(bpe)),
                Err(e) => {
                    debug!(model = model_name, error = %e, "No BPE encoding, estimating");
                    None
                }
            })
            .clone()
    }
}

impl Tokenizer for BpeTokenizer {
    fn count(&self, model_name: &str, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encoder(model_name) {
            Some(bpe) => bpe.encode_with_special_tokens(text).len() + self.message_overhead,
            None => self.fallback.count(model_name, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_counts_zero() {
        assert_eq!(BpeTokenizer::new().count("gpt-4", ""), 0);
    }

    #[test]
    fn test_counts_bpe_tokens_for_openai_models() {
        let tokenizer = BpeTokenizer::new().with_message_overhead(0);
        assert_eq!(tokenizer.count("gpt-4", "hello world"), 2);
        assert_eq!(tokenizer.count("gpt-4o", "hello world"), 2);
    }

    #[test]
    fn test_overhead_is_added_per_message() {
        let tokenizer = BpeTokenizer::new();
        assert_eq!(
            tokenizer.count("gpt-4", "hello world"),
            2 + MESSAGE_OVERHEAD_TOKENS
        );
    }

    #[test]
    fn test_unknown_model_uses_heuristic() {
        let tokenizer = BpeTokenizer::new().with_message_overhead(0);
        let heuristic = HeuristicTokenizer::new().with_message_overhead(0);
        for model in ["claude-3-opus", "llama3"] {
            assert_eq!(
                tokenizer.count(model, "abcdefgh"),
                heuristic.count(model, "abcdefgh")
            );
        }
    }

    #[test]
    fn test_encoders_are_cached_per_model() {
        let tokenizer = BpeTokenizer::new();
        let text = "The quick brown fox jumps over the lazy dog.";
        let first = tokenizer.count("gpt-4", text);
        assert_eq!(tokenizer.count("gpt-4", text), first);
        tokenizer.count("llama3", text);

        let encoders = tokenizer.encoders.lock().unwrap();
        assert_eq!(encoders.len(), 2);
        assert!(encoders["gpt-4"].is_some());
        assert!(encoders["llama3"].is_none());
    }
}
