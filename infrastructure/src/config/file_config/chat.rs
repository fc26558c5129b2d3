//! Chat configuration from TOML (`[chat]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use chat_service_domain::{SamplingParams, TEMPERATURE_RANGE};
use serde::{Deserialize, Serialize};

/// System prompt and sampling parameters for new chats.
///
/// # Example
///
/// ```toml
/// [chat]
/// system_message = "You are a terse assistant."
/// temperature = 0.7
/// stop = ["\n\n"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    pub system_message: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Number of completions (`n`).
    pub n: u32,
    pub stop: Vec<String>,
    /// Cap on generated tokens per reply; `0` leaves it to the provider.
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        let sampling = SamplingParams::default();
        Self {
            system_message: chat_service_application::config::DEFAULT_SYSTEM_MESSAGE.to_string(),
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            n: sampling.sample_count,
            stop: sampling.stop_sequences,
            max_tokens: sampling.max_output_tokens,
            presence_penalty: sampling.presence_penalty,
            frequency_penalty: sampling.frequency_penalty,
        }
    }
}

impl FileChatConfig {
    pub fn to_sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            sample_count: self.n,
            stop_sequences: self.stop.clone(),
            max_output_tokens: self.max_tokens,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TemperatureOutOfRange,
                format!(
                    "chat.temperature: {} is outside {}..={}",
                    self.temperature,
                    TEMPERATURE_RANGE.start(),
                    TEMPERATURE_RANGE.end()
                ),
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sampling_defaults() {
        assert_eq!(FileChatConfig::default().to_sampling(), SamplingParams::default());
    }

    #[test]
    fn test_temperature_out_of_range() {
        let config = FileChatConfig {
            temperature: 2.5,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::TemperatureOutOfRange);
    }
}
