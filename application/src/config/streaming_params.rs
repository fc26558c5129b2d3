//! Streaming parameters: output channel control for a turn.

use serde::{Deserialize, Serialize};

/// Controls how a turn publishes its cumulative-text events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingParams {
    /// Capacity of the bounded event channel. A consumer slower than the
    /// provider blocks the stream reader once this many events are queued.
    pub event_buffer: usize,
}

impl Default for StreamingParams {
    fn default() -> Self {
        Self { event_buffer: 32 }
    }
}

impl StreamingParams {
    /// Set the channel capacity (clamped to at least 1).
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }
}
