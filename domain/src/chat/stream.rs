//! Streaming events from a completion provider.
//!
//! [`StreamEvent`] bridges infrastructure-level streaming (e.g. SSE frames
//! from an HTTP provider) to the application layer. A well-formed stream is
//! zero or more `Delta` events followed by exactly one terminal event.

/// An event in a streaming completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment from the model.
    Delta(String),
    /// End marker: the provider finished the completion.
    Completed,
    /// The stream failed; no further events follow.
    Error(String),
}

impl StreamEvent {
    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_not_terminal() {
        let event = StreamEvent::Delta("hello".to_string());
        assert!(!event.is_terminal());
    }

    #[test]
    fn completed_is_terminal() {
        assert!(StreamEvent::Completed.is_terminal());
    }

    #[test]
    fn error_is_terminal() {
        let event = StreamEvent::Error("oops".to_string());
        assert!(event.is_terminal());
    }
}
