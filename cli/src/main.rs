//! CLI entrypoint for chat-service
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chat_service_application::{
    ChatCompletionConfig, ChatCompletionInput, ChatCompletionStreamUseCase, ChatGateway,
    ConversationLogger, EndChatUseCase, LlmGateway, NoConversationLogger, SessionLocks,
    StreamingParams,
};
use chat_service_domain::{ChatId, Model, Tokenizer};
use chat_service_infrastructure::{
    BpeTokenizer, ConfigLoader, FileConfig, HeuristicTokenizer, InMemoryChatGateway,
    JsonFileChatGateway, JsonlConversationLogger, OpenAiCompatConfig, OpenAiCompatGateway,
    StorageBackend, TokenizerKind,
};
use chat_service_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, ProgressReporter, StreamPrinter, render_turn,
};
use clap::Parser;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    info!("Starting chat-service");

    // === Configuration ===
    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = file_config.validate();
    for issue in &issues {
        if issue.is_error() {
            error!("{}", issue.message);
        } else {
            warn!("{}", issue.message);
        }
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Invalid configuration, see errors above");
    }

    let completion_config = apply_overrides(file_config.to_completion_config(), &cli);
    completion_config
        .to_chat_config()
        .and_then(|config| config.validate().map(|_| config))
        .context("Invalid chat settings")?;

    // === Dependency Injection ===
    let chats = build_chat_store(&file_config).await?;
    let llm = build_llm_gateway(&file_config)?;
    let tokenizer = build_tokenizer(&file_config);
    let conversation_logger = build_conversation_logger(&file_config);
    let session_locks = SessionLocks::new();
    let cancellation = CancellationToken::new();

    let turns = ChatCompletionStreamUseCase::new(chats.clone(), llm, tokenizer)
        .with_conversation_logger(conversation_logger.clone())
        .with_session_locks(session_locks.clone())
        .with_streaming(StreamingParams::default())
        .with_cancellation(cancellation.clone());
    let end_chat = EndChatUseCase::new(chats)
        .with_conversation_logger(conversation_logger)
        .with_session_locks(session_locks);

    let session = ChatId::new(cli.session.clone().unwrap_or_default());

    // End mode
    if cli.end {
        let chat = end_chat.execute(&session).await?;
        match cli.output {
            OutputFormat::Text => println!("{}", ConsoleFormatter::format_chat_summary(&chat)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chat)?),
        }
        return Ok(());
    }

    // Chat mode
    if cli.chat {
        let mut repl = ChatRepl::new(turns, end_chat, completion_config, cli.user.clone())
            .with_session(session)
            .with_progress(!cli.quiet);

        repl.run().await?;
        return Ok(());
    }

    // Single turn mode - message is required
    let message = match cli.message.clone() {
        Some(m) => m,
        None => bail!("Message is required. Use --chat for interactive mode."),
    };

    tokio::spawn({
        let token = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    let model = completion_config.model.clone();
    let input = ChatCompletionInput::new(session, cli.user.clone(), message, completion_config);
    let handle = turns.spawn(input);

    match cli.output {
        OutputFormat::Text => {
            let progress = ProgressReporter::new(!cli.quiet, &model);
            let mut printer = StreamPrinter::stdout();
            let output = render_turn(handle, &mut printer, &progress)
                .await
                .inspect_err(|e| eprintln!("{}", ConsoleFormatter::format_error(e)))?;
            if !cli.quiet {
                eprintln!("{}", ConsoleFormatter::format_turn_footer(&output));
            }
        }
        OutputFormat::Json => {
            let output = handle.finish().await?;
            println!("{}", ConsoleFormatter::format_json(&output));
        }
    }

    Ok(())
}

/// Install the tracing subscriber, writing to `--log-file` when given.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::new(cli.log_level());

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Command-line flags take precedence over configuration files.
fn apply_overrides(mut config: ChatCompletionConfig, cli: &Cli) -> ChatCompletionConfig {
    if let Some(name) = &cli.model {
        let max_tokens = cli
            .max_context
            .or_else(|| Model::known_context_window(name))
            .unwrap_or(config.model_max_tokens);
        config = config.with_model(name.clone(), max_tokens);
    } else if let Some(max_tokens) = cli.max_context {
        config.model_max_tokens = max_tokens;
    }
    if let Some(temperature) = cli.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(system) = &cli.system {
        config = config.with_system_message(system.clone());
    }
    config
}

async fn build_chat_store(config: &FileConfig) -> Result<Arc<dyn ChatGateway>> {
    let (backend, _) = config.storage.parse_backend();
    match backend {
        StorageBackend::Memory => {
            info!("Using in-memory chat store");
            Ok(Arc::new(InMemoryChatGateway::new()))
        }
        StorageBackend::File => {
            let dir = config
                .storage
                .resolved_dir()
                .context("No storage directory configured and no data directory available")?;
            info!("Using chat store at {}", dir.display());
            Ok(Arc::new(JsonFileChatGateway::new(dir).await?))
        }
    }
}

fn build_tokenizer(config: &FileConfig) -> Arc<dyn Tokenizer> {
    match config.model.parse_tokenizer().0 {
        TokenizerKind::Bpe => Arc::new(BpeTokenizer::new()),
        TokenizerKind::Heuristic => Arc::new(HeuristicTokenizer::new()),
    }
}

fn build_llm_gateway(config: &FileConfig) -> Result<Arc<dyn LlmGateway>> {
    let provider = &config.provider;
    let api_key = provider.resolve_api_key().map(SecretString::from);
    if api_key.is_none() {
        warn!(
            "No API key found (set {} or provider.api_key)",
            provider.api_key_env
        );
    }

    let gateway = OpenAiCompatGateway::new(OpenAiCompatConfig {
        base_url: provider.base_url.clone(),
        api_key,
        request_timeout: Duration::from_secs(provider.request_timeout_secs),
        ..Default::default()
    })?;
    info!("Completion endpoint: {}", gateway.endpoint());
    Ok(Arc::new(gateway))
}

fn build_conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    match config
        .logging
        .conversation_log
        .as_ref()
        .and_then(JsonlConversationLogger::new)
    {
        Some(logger) => {
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_override_uses_known_window() {
        let cli = Cli::parse_from(["chat-service", "--model", "gpt-4", "hi"]);
        let config = apply_overrides(ChatCompletionConfig::default(), &cli);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.model_max_tokens, 8192);
    }

    #[test]
    fn test_max_context_override_wins() {
        let cli = Cli::parse_from([
            "chat-service",
            "--model",
            "gpt-4",
            "--max-context",
            "500",
            "--temperature",
            "0.1",
            "--system",
            "terse",
        ]);
        let config = apply_overrides(ChatCompletionConfig::default(), &cli);
        assert_eq!(config.model_max_tokens, 500);
        assert_eq!(config.sampling.temperature, 0.1);
        assert_eq!(config.initial_system_message, "terse");
    }

    #[test]
    fn test_unknown_model_keeps_configured_budget() {
        let cli = Cli::parse_from(["chat-service", "--model", "local-llama"]);
        let base = ChatCompletionConfig::default().with_model("gpt-4o-mini", 1234);
        let config = apply_overrides(base, &cli);
        assert_eq!(config.model_max_tokens, 1234);
    }
}
