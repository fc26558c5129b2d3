//! Wire types for `POST /chat/completions` with `stream: true`.

use chat_service_application::ports::llm_gateway::CompletionRequest;
use serde::{Deserialize, Serialize};

/// Request body.
#[derive(Debug, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    pub stream: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub stop: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatCompletionBody<'a> {
    pub fn from_request(request: &'a CompletionRequest) -> Self {
        let sampling = &request.sampling;
        Self {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            n: sampling.sample_count,
            stop: &sampling.stop_sequences,
            max_tokens: (sampling.max_output_tokens > 0).then_some(sampling.max_output_tokens),
            presence_penalty: sampling.presence_penalty,
            frequency_penalty: sampling.frequency_penalty,
        }
    }
}

/// One `data:` frame of the stream.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Text of the first choice, if non-empty. Other choices (`n > 1`) are ignored.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| c.index == 0)
            .and_then(|c| c.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    pub fn is_finished(&self) -> bool {
        self.choices
            .iter()
            .any(|c| c.index == 0 && c.finish_reason.is_some())
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_service_application::ports::llm_gateway::PromptMessage;
    use chat_service_domain::{Role, SamplingParams};

    #[test]
    fn test_body_serialization() {
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![
                PromptMessage {
                    role: Role::System,
                    content: "be nice".into(),
                },
                PromptMessage {
                    role: Role::User,
                    content: "hi".into(),
                },
            ],
            sampling: SamplingParams {
                temperature: 0.5,
                ..Default::default()
            },
        };

        let body = serde_json::to_value(ChatCompletionBody::from_request(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["temperature"], 0.5);
        assert!(body.get("stop").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_chunk_text_and_finish() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.first_text(), Some("Hel"));
        assert!(!chunk.is_finished());

        let last: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#)
                .unwrap();
        assert_eq!(last.first_text(), None);
        assert!(last.is_finished());
    }

    #[test]
    fn test_role_only_delta_has_no_text() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.first_text(), None);
    }
}
