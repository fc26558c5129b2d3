//! Chat configuration: the model plus sampling parameters forwarded to the
//! completion provider.

use crate::core::error::ValidationError;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Inclusive temperature bounds accepted by a chat.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Sampling parameters passed opaquely to the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    /// Number of completions to sample (`n`).
    pub sample_count: u32,
    pub stop_sequences: Vec<String>,
    /// Cap on generated tokens per completion; `0` leaves it to the provider.
    pub max_output_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            sample_count: 1,
            stop_sequences: Vec::new(),
            max_output_tokens: 0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

/// Configuration owned by a chat for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    model: Model,
    sampling: SamplingParams,
}

impl ChatConfig {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            sampling: SamplingParams::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.sampling.temperature = temperature;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    pub fn temperature(&self) -> f32 {
        self.sampling.temperature
    }

    /// The temperature must lie within [`TEMPERATURE_RANGE`]; NaN is rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.model.validate()?;
        if !TEMPERATURE_RANGE.contains(&self.sampling.temperature) {
            return Err(ValidationError::InvalidTemperature(
                self.sampling.temperature,
            ));
        }
        Ok(())
    }
}
