//! Chat completion stream use case.
//!
//! Runs one conversational turn against a persisted [`Chat`]:
//!
//! 1. Load the chat, or create and persist it when the gateway reports not-found
//! 2. Append the user turn (may evict the oldest turns)
//! 3. Open a completion stream over the current window
//! 4. Publish the cumulative text after every fragment
//! 5. Append the assistant turn and save the chat
//!
//! Any failure aborts the turn. The only durable write of a turn is the
//! final save (plus the initial create for a new chat), so an aborted turn
//! leaves storage as it was.

use crate::config::{ChatCompletionConfig, StreamingParams};
use crate::ports::chat_gateway::{ChatGateway, ChatGatewayError};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway, StreamHandle};
use crate::use_cases::session_locks::SessionLocks;
use chat_service_domain::{
    Chat, ChatId, DomainError, Message, StreamEvent, Tokenizer, ValidationError,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that abort a turn, one per protocol step.
#[derive(Error, Debug)]
pub enum ChatCompletionError {
    #[error("error fetching chat: {0}")]
    FetchChat(ChatGatewayError),

    #[error("error creating new chat: {0}")]
    CreateChat(DomainError),

    #[error("error persisting new chat: {0}")]
    PersistNewChat(ChatGatewayError),

    #[error("error creating user message: {0}")]
    UserMessage(ValidationError),

    #[error("error adding new message: {0}")]
    AddMessage(DomainError),

    #[error("error creating chat completion: {0}")]
    OpenStream(GatewayError),

    #[error("error streaming response: {0}")]
    Stream(String),

    #[error("error streaming response: stream closed before completion")]
    StreamClosed,

    #[error("turn cancelled")]
    Cancelled,

    #[error("error creating assistant message: {0}")]
    AssistantMessage(DomainError),

    #[error("error saving chat: {0}")]
    SaveChat(ChatGatewayError),

    #[error("turn task failed: {0}")]
    Join(String),
}

impl ChatCompletionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChatCompletionError::Cancelled)
    }
}

/// Input for the [`ChatCompletionStreamUseCase`].
#[derive(Debug, Clone)]
pub struct ChatCompletionInput {
    /// Session to continue. Empty means "start a new session".
    pub chat_id: ChatId,
    pub user_id: String,
    pub user_message: String,
    /// Used only when the session has to be created.
    pub config: ChatCompletionConfig,
}

impl ChatCompletionInput {
    pub fn new(
        chat_id: impl Into<ChatId>,
        user_id: impl Into<String>,
        user_message: impl Into<String>,
        config: ChatCompletionConfig,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            user_message: user_message.into(),
            config,
        }
    }
}

/// One event of a turn; `content` is the cumulative text so far.
///
/// The value returned when the turn completes carries the full answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCompletionOutput {
    pub chat_id: ChatId,
    pub user_id: String,
    pub content: String,
}

/// A turn running on its own task.
pub struct TurnHandle {
    /// Cumulative-text events. Dropping the receiver cancels the turn.
    pub events: mpsc::Receiver<ChatCompletionOutput>,
    result: JoinHandle<Result<ChatCompletionOutput, ChatCompletionError>>,
}

impl TurnHandle {
    /// Next cumulative-text event, `None` once the turn has stopped publishing.
    pub async fn next_event(&mut self) -> Option<ChatCompletionOutput> {
        self.events.recv().await
    }

    /// Drain the remaining events and wait for the terminal result.
    pub async fn finish(mut self) -> Result<ChatCompletionOutput, ChatCompletionError> {
        while self.events.recv().await.is_some() {}
        self.result
            .await
            .map_err(|e| ChatCompletionError::Join(e.to_string()))?
    }
}

/// Use case for one streamed chat turn.
pub struct ChatCompletionStreamUseCase {
    chats: Arc<dyn ChatGateway>,
    llm: Arc<dyn LlmGateway>,
    tokenizer: Arc<dyn Tokenizer>,
    conversation_logger: Arc<dyn ConversationLogger>,
    session_locks: SessionLocks,
    cancellation: Option<CancellationToken>,
    streaming: StreamingParams,
}

impl Clone for ChatCompletionStreamUseCase {
    fn clone(&self) -> Self {
        Self {
            chats: self.chats.clone(),
            llm: self.llm.clone(),
            tokenizer: self.tokenizer.clone(),
            conversation_logger: self.conversation_logger.clone(),
            session_locks: self.session_locks.clone(),
            cancellation: self.cancellation.clone(),
            streaming: self.streaming.clone(),
        }
    }
}

impl ChatCompletionStreamUseCase {
    pub fn new(
        chats: Arc<dyn ChatGateway>,
        llm: Arc<dyn LlmGateway>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        Self {
            chats,
            llm,
            tokenizer,
            conversation_logger: Arc::new(NoConversationLogger),
            session_locks: SessionLocks::new(),
            cancellation: None,
            streaming: StreamingParams::default(),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Share a lock registry with other use cases touching the same chats.
    pub fn with_session_locks(mut self, locks: SessionLocks) -> Self {
        self.session_locks = locks;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_streaming(mut self, streaming: StreamingParams) -> Self {
        self.streaming = streaming;
        self
    }

    /// Run the turn on a new task, publishing into a bounded channel.
    pub fn spawn(&self, input: ChatCompletionInput) -> TurnHandle {
        let (tx, rx) = mpsc::channel(self.streaming.event_buffer.max(1));
        let use_case = self.clone();
        let result = tokio::spawn(async move { use_case.execute(input, tx).await });
        TurnHandle { events: rx, result }
    }

    /// Run the turn inline, publishing cumulative-text events to `events`.
    ///
    /// Sending blocks while the channel is full. Dropping the receiver at
    /// any point before the save cancels the turn without persisting it.
    pub async fn execute(
        &self,
        input: ChatCompletionInput,
        events: mpsc::Sender<ChatCompletionOutput>,
    ) -> Result<ChatCompletionOutput, ChatCompletionError> {
        let ChatCompletionInput {
            chat_id,
            user_id,
            user_message,
            config,
        } = input;

        let lookup = !chat_id.is_empty();
        let chat_id = if lookup { chat_id } else { ChatId::generate() };
        let _session = self.session_locks.acquire(&chat_id).await;

        let mut chat = self
            .load_or_create(chat_id, lookup, &user_id, &config)
            .await?;
        let chat_id = chat.id().clone();

        let user_turn = Message::user(user_message, chat.config().model(), self.tokenizer.as_ref())
            .map_err(ChatCompletionError::UserMessage)?;
        let user_tokens = user_turn.token_count();
        let outcome = chat
            .add_message(user_turn)
            .map_err(ChatCompletionError::AddMessage)?;
        info!(
            chat_id = %chat_id,
            tokens = user_tokens,
            evicted = outcome.evicted,
            usage = chat.token_usage(),
            "Added user message"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            serde_json::json!({
                "chat_id": chat_id.as_str(),
                "user_id": user_id,
                "tokens": user_tokens,
                "token_usage": chat.token_usage(),
            }),
        ));
        self.log_evictions(&chat, outcome.evicted, "user");

        let request = CompletionRequest::from_chat(&chat);
        debug!(
            chat_id = %chat_id,
            model = %request.model,
            messages = request.messages.len(),
            "Opening completion stream"
        );
        let handle = self
            .cancellable(self.llm.stream_completion(request))
            .await?
            .map_err(ChatCompletionError::OpenStream)?;

        let content = self
            .consume_stream(handle, &chat_id, &user_id, &events)
            .await
            .inspect_err(|e| warn!(chat_id = %chat_id, "Turn aborted: {}", e))?;

        let model = chat.config().model().clone();
        let assistant_turn = Message::assistant(content.clone(), &model, self.tokenizer.as_ref())
            .map_err(|e| ChatCompletionError::AssistantMessage(e.into()))?;
        let assistant_tokens = assistant_turn.token_count();
        let outcome = chat
            .add_message(assistant_turn)
            .map_err(ChatCompletionError::AssistantMessage)?;
        self.conversation_logger.log(ConversationEvent::new(
            "completion",
            serde_json::json!({
                "chat_id": chat_id.as_str(),
                "model": model.name(),
                "tokens": assistant_tokens,
                "bytes": content.len(),
                "text": content,
            }),
        ));
        self.log_evictions(&chat, outcome.evicted, "assistant");

        // The caller may have gone away after the end marker arrived.
        if events.is_closed() || self.is_cancelled() {
            warn!(chat_id = %chat_id, "Turn abandoned before save");
            return Err(ChatCompletionError::Cancelled);
        }

        self.chats
            .save_chat(&chat)
            .await
            .map_err(ChatCompletionError::SaveChat)?;
        info!(
            chat_id = %chat_id,
            messages = chat.count_messages(),
            erased = chat.erased_messages().len(),
            usage = chat.token_usage(),
            "Chat saved"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "chat_saved",
            serde_json::json!({
                "chat_id": chat_id.as_str(),
                "messages": chat.count_messages(),
                "token_usage": chat.token_usage(),
            }),
        ));

        Ok(ChatCompletionOutput {
            chat_id,
            user_id,
            content,
        })
    }

    async fn load_or_create(
        &self,
        chat_id: ChatId,
        lookup: bool,
        user_id: &str,
        config: &ChatCompletionConfig,
    ) -> Result<Chat, ChatCompletionError> {
        if lookup {
            match self.chats.find_chat_by_id(&chat_id).await {
                Ok(chat) => {
                    debug!(chat_id = %chat_id, usage = chat.token_usage(), "Continuing chat");
                    return Ok(chat);
                }
                Err(e) if e.is_not_found() => {
                    debug!(chat_id = %chat_id, "Chat not found, creating");
                }
                Err(e) => return Err(ChatCompletionError::FetchChat(e)),
            }
        }

        let chat_config = config
            .to_chat_config()
            .map_err(|e| ChatCompletionError::CreateChat(e.into()))?;
        let system = Message::system(
            config.initial_system_message.clone(),
            chat_config.model(),
            self.tokenizer.as_ref(),
        )
        .map_err(|e| ChatCompletionError::CreateChat(e.into()))?;
        let chat = Chat::with_id(chat_id, user_id, system, chat_config)
            .map_err(ChatCompletionError::CreateChat)?;

        self.chats
            .create_chat(&chat)
            .await
            .map_err(ChatCompletionError::PersistNewChat)?;

        info!(
            chat_id = %chat.id(),
            model = %chat.config().model(),
            "Created chat"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "chat_created",
            serde_json::json!({
                "chat_id": chat.id().as_str(),
                "user_id": user_id,
                "model": chat.config().model().name(),
                "max_tokens": chat.config().model().max_tokens(),
            }),
        ));
        Ok(chat)
    }

    /// Read the stream to its end marker, publishing cumulative text.
    async fn consume_stream(
        &self,
        handle: StreamHandle,
        chat_id: &ChatId,
        user_id: &str,
        events: &mpsc::Sender<ChatCompletionOutput>,
    ) -> Result<String, ChatCompletionError> {
        let mut receiver = handle.receiver;
        let mut content = String::new();
        let mut fragments = 0usize;

        loop {
            let next = self
                .cancellable(async {
                    tokio::select! {
                        biased;
                        _ = events.closed() => None,
                        event = receiver.recv() => Some(event),
                    }
                })
                .await?;
            let Some(next) = next else {
                debug!(chat_id = %chat_id, "Event receiver dropped while waiting for provider");
                return Err(ChatCompletionError::Cancelled);
            };
            match next {
                Some(StreamEvent::Delta(fragment)) => {
                    fragments += 1;
                    content.push_str(&fragment);
                    let output = ChatCompletionOutput {
                        chat_id: chat_id.clone(),
                        user_id: user_id.to_string(),
                        content: content.clone(),
                    };
                    if self.cancellable(events.send(output)).await?.is_err() {
                        debug!(chat_id = %chat_id, "Event receiver dropped");
                        return Err(ChatCompletionError::Cancelled);
                    }
                }
                Some(StreamEvent::Completed) => {
                    debug!(chat_id = %chat_id, fragments, bytes = content.len(), "Stream completed");
                    return Ok(content);
                }
                Some(StreamEvent::Error(e)) => return Err(ChatCompletionError::Stream(e)),
                None => return Err(ChatCompletionError::StreamClosed),
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Race `future` against the cancellation token, if any.
    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output, ChatCompletionError> {
        match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(ChatCompletionError::Cancelled),
                output = future => Ok(output),
            },
            None => Ok(future.await),
        }
    }

    fn log_evictions(&self, chat: &Chat, evicted: usize, trigger: &str) {
        if evicted == 0 {
            return;
        }
        info!(chat_id = %chat.id(), evicted, trigger, "Evicted oldest messages");
        self.conversation_logger.log(ConversationEvent::new(
            "messages_evicted",
            serde_json::json!({
                "chat_id": chat.id().as_str(),
                "evicted": evicted,
                "trigger": trigger,
                "erased_total": chat.erased_messages().len(),
                "token_usage": chat.token_usage(),
            }),
        ));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use chat_service_domain::{ChatConfig, Model};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts whitespace-separated words.
    pub(crate) struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn count(&self, _model_name: &str, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[derive(Default)]
    pub(crate) struct MockChatGateway {
        pub chats: Mutex<HashMap<ChatId, Chat>>,
        pub find_error: Mutex<Option<ChatGatewayError>>,
        pub save_error: Mutex<Option<ChatGatewayError>>,
        pub create_calls: AtomicUsize,
        pub find_calls: AtomicUsize,
        pub save_calls: AtomicUsize,
    }

    impl MockChatGateway {
        pub fn with_chat(chat: Chat) -> Self {
            let gateway = Self::default();
            gateway
                .chats
                .lock()
                .unwrap()
                .insert(chat.id().clone(), chat);
            gateway
        }

        pub fn stored(&self, id: &ChatId) -> Option<Chat> {
            self.chats.lock().unwrap().get(id).cloned()
        }

        pub fn creates(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn finds(&self) -> usize {
            self.find_calls.load(Ordering::SeqCst)
        }

        pub fn saves(&self) -> usize {
            self.save_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatGateway for MockChatGateway {
        async fn create_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.chats
                .lock()
                .unwrap()
                .insert(chat.id().clone(), chat.clone());
            Ok(())
        }

        async fn find_chat_by_id(&self, id: &ChatId) -> Result<Chat, ChatGatewayError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.find_error.lock().unwrap().take() {
                return Err(e);
            }
            self.chats
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ChatGatewayError::NotFound(id.clone()))
        }

        async fn save_chat(&self, chat: &Chat) -> Result<(), ChatGatewayError> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.save_error.lock().unwrap().take() {
                return Err(e);
            }
            self.chats
                .lock()
                .unwrap()
                .insert(chat.id().clone(), chat.clone());
            Ok(())
        }
    }

    pub(crate) enum Script {
        /// Send the events, then close the channel.
        Events(Vec<StreamEvent>),
        /// Send the events and keep the channel open.
        Stall(Vec<StreamEvent>),
        /// Fail to open the stream.
        OpenError,
    }

    #[derive(Default)]
    pub(crate) struct ScriptedLlm {
        pub scripts: Mutex<VecDeque<Script>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
        stalled: Mutex<Vec<mpsc::Sender<StreamEvent>>>,
    }

    impl ScriptedLlm {
        pub fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                ..Default::default()
            }
        }

        pub fn replying(fragments: &[&str]) -> Self {
            let mut events: Vec<StreamEvent> = fragments
                .iter()
                .map(|f| StreamEvent::Delta(f.to_string()))
                .collect();
            events.push(StreamEvent::Completed);
            Self::new(vec![Script::Events(events)])
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Push one more event into the oldest stalled stream.
        ///
        /// Returns false when that stream's reader is already gone.
        pub async fn send_stalled(&self, event: StreamEvent) -> bool {
            let tx = self.stalled.lock().unwrap().first().cloned();
            match tx {
                Some(tx) => tx.send(event).await.is_ok(),
                None => false,
            }
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedLlm {
        async fn stream_completion(
            &self,
            request: CompletionRequest,
        ) -> Result<StreamHandle, GatewayError> {
            self.requests.lock().unwrap().push(request);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left");
            let (events, keep_open) = match script {
                Script::Events(events) => (events, false),
                Script::Stall(events) => (events, true),
                Script::OpenError => {
                    return Err(GatewayError::ConnectionError("refused".into()));
                }
            };
            let (tx, rx) = mpsc::channel(events.len() + 1);
            for event in events {
                tx.send(event).await.unwrap();
            }
            if keep_open {
                self.stalled.lock().unwrap().push(tx);
            }
            Ok(StreamHandle::new(rx))
        }
    }

    pub(crate) fn words(n: usize) -> String {
        vec!["w"; n].join(" ")
    }

    pub(crate) fn existing_chat(id: &str, max_tokens: usize, system_tokens: usize) -> Chat {
        let model = Model::new("gpt-4o", max_tokens).unwrap();
        let system = Message::system(words(system_tokens), &model, &WordTokenizer).unwrap();
        let config = ChatConfig::new(model).with_temperature(0.2);
        Chat::with_id(ChatId::new(id), "user-1", system, config).unwrap()
    }
}
