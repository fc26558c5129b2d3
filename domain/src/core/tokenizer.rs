//! Tokenizer trait

/// Deterministic, model-aware token counter.
///
/// Implementations must be pure: the same model name and text always yield
/// the same count. Adapters live in the infrastructure layer.
pub trait Tokenizer: Send + Sync {
    /// Count the tokens `text` occupies in the context window of `model_name`.
    fn count(&self, model_name: &str, text: &str) -> usize;
}
