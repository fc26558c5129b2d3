//! Character-ratio token estimation.
//!
//! Counts are deterministic and depend only on the model family and the
//! character count, so a message's token count is reproducible after a
//! round trip through storage.

use chat_service_domain::Tokenizer;

/// Characters per token for the GPT and Claude families (English prose).
const FAMILY_CHARS_PER_TOKEN: f64 = 4.0;

/// Characters per token for anything else. Smaller ratio overestimates,
/// which is safer for the budget than underestimating.
const FALLBACK_CHARS_PER_TOKEN: f64 = 3.5;

/// Role label and formatting tokens added per message.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

const FAMILY_PREFIXES: &[&str] = &["gpt-", "o1", "o3", "o4", "chatgpt", "claude"];

/// Estimates tokens from character counts.
#[derive(Debug, Clone)]
pub struct HeuristicTokenizer {
    message_overhead: usize,
}

impl Default for HeuristicTokenizer {
    fn default() -> Self {
        Self {
            message_overhead: MESSAGE_OVERHEAD_TOKENS,
        }
    }
}

impl HeuristicTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_overhead(mut self, overhead: usize) -> Self {
        self.message_overhead = overhead;
        self
    }

    fn chars_per_token(model_name: &str) -> f64 {
        let name = model_name.to_ascii_lowercase();
        if FAMILY_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
            FAMILY_CHARS_PER_TOKEN
        } else {
            FALLBACK_CHARS_PER_TOKEN
        }
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn count(&self, model_name: &str, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let chars = text.chars().count() as f64;
        (chars / Self::chars_per_token(model_name)).ceil() as usize + self.message_overhead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_counts_zero() {
        assert_eq!(HeuristicTokenizer::new().count("gpt-4o", ""), 0);
    }

    #[test]
    fn test_gpt_family_ratio() {
        let tokenizer = HeuristicTokenizer::new().with_message_overhead(0);
        assert_eq!(tokenizer.count("gpt-4o", "abcdefgh"), 2);
        assert_eq!(tokenizer.count("gpt-4o", "abcdefghi"), 3);
        assert_eq!(tokenizer.count("claude-3-opus", "abcd"), 1);
    }

    #[test]
    fn test_other_models_use_denser_ratio() {
        let tokenizer = HeuristicTokenizer::new().with_message_overhead(0);
        // 7 chars / 3.5 = 2, 8 chars / 3.5 = 2.29 -> 3
        assert_eq!(tokenizer.count("llama3", "abcdefg"), 2);
        assert_eq!(tokenizer.count("llama3", "abcdefgh"), 3);
    }

    #[test]
    fn test_overhead_is_added_per_message() {
        let tokenizer = HeuristicTokenizer::new();
        assert_eq!(tokenizer.count("gpt-4", "abcd"), 1 + MESSAGE_OVERHEAD_TOKENS);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let tokenizer = HeuristicTokenizer::new().with_message_overhead(0);
        assert_eq!(tokenizer.count("gpt-4", "éééé"), 1);
    }

    #[test]
    fn test_is_deterministic() {
        let tokenizer = HeuristicTokenizer::new();
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(tokenizer.count("gpt-4", text), tokenizer.count("gpt-4", text));
    }
}
