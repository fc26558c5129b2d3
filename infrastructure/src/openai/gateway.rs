//! OpenAI-compatible streaming completion gateway.
//!
//! Opens `POST {base_url}/chat/completions` with `stream: true` and forwards
//! the response through a background reader task:
//!
//! ```text
//! HTTP body ──sse::frames──> ChatCompletionChunk ──Delta(text)──> StreamHandle
//!                            data: [DONE]        ──Completed────>
//!                            read / parse error  ──Error(msg)───>
//! ```
//!
//! HTTP status errors are reported when the stream is opened; anything that
//! goes wrong afterwards arrives as a terminal [`StreamEvent::Error`].

use super::error::OpenAiError;
use super::protocol::{ApiErrorBody, ChatCompletionBody, ChatCompletionChunk};
use super::sse::{self, SseFrame};
use async_trait::async_trait;
use chat_service_application::ports::llm_gateway::{
    CompletionRequest, GatewayError, LlmGateway, StreamHandle,
};
use chat_service_domain::StreamEvent;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Connection settings for [`OpenAiCompatGateway`].
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token; omitted for local servers that need none.
    pub api_key: Option<SecretString>,
    /// Time allowed until response headers arrive.
    pub request_timeout: Duration,
    /// Capacity of the fragment channel handed to the caller.
    pub event_buffer: usize,
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(60),
            event_buffer: 32,
        }
    }
}

/// [`LlmGateway`] for any server speaking the OpenAI chat completions API.
pub struct OpenAiCompatGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    request_timeout: Duration,
    event_buffer: usize,
}

impl OpenAiCompatGateway {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, OpenAiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: completions_endpoint(&config.base_url),
            api_key: config.api_key,
            request_timeout: config.request_timeout,
            event_buffer: config.event_buffer.max(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn open(&self, request: &CompletionRequest) -> Result<reqwest::Response, OpenAiError> {
        let body = ChatCompletionBody::from_request(request);
        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = tokio::time::timeout(self.request_timeout, builder.send())
            .await
            .map_err(|_| OpenAiError::Timeout)??;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        Err(OpenAiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Map one SSE frame to the event forwarded to the caller.
///
/// `Ok(None)` means the frame carries nothing to forward (role-only or
/// finish-only chunks). `finished` records whether a finish reason was seen.
fn frame_to_event(
    frame: Result<SseFrame, OpenAiError>,
    finished: &mut bool,
) -> Option<StreamEvent> {
    match frame {
        Ok(SseFrame::Done) => Some(StreamEvent::Completed),
        Ok(SseFrame::Data(data)) => match serde_json::from_str::<ChatCompletionChunk>(&data) {
            Ok(chunk) => {
                *finished |= chunk.is_finished();
                chunk.first_text().map(|text| StreamEvent::Delta(text.to_string()))
            }
            Err(e) => Some(StreamEvent::Error(
                OpenAiError::Parse {
                    error: e.to_string(),
                    raw: data,
                }
                .to_string(),
            )),
        },
        Err(e) => Some(StreamEvent::Error(e.to_string())),
    }
}

/// Forward frames until a terminal event or the receiver goes away.
async fn pump<S>(frames: S, tx: mpsc::Sender<StreamEvent>)
where
    S: futures::Stream<Item = Result<SseFrame, OpenAiError>>,
{
    futures::pin_mut!(frames);
    let mut finished = false;

    while let Some(frame) = frames.next().await {
        let Some(event) = frame_to_event(frame, &mut finished) else {
            continue;
        };
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            debug!("Stream receiver dropped, stopping reader");
            return;
        }
        if terminal {
            return;
        }
    }

    // Body ended without [DONE]. A finish reason still marks a complete answer.
    if finished {
        let _ = tx.send(StreamEvent::Completed).await;
    } else {
        warn!("Completion stream ended without end marker");
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatGateway {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamHandle, GatewayError> {
        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            messages = request.messages.len(),
            "Opening completion stream"
        );
        let response = self.open(&request).await?;

        let (tx, rx) = mpsc::channel(self.event_buffer);
        tokio::spawn(pump(sse::frames(response.bytes_stream()), tx));
        Ok(StreamHandle::new(rx))
    }
}
