//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::config::ReplConfig;
use crate::output::console::ConsoleFormatter;
use crate::output::stream_printer::{StreamPrinter, render_turn};
use crate::progress::reporter::ProgressReporter;
use chat_service_application::{
    ChatCompletionConfig, ChatCompletionInput, ChatCompletionStreamUseCase, EndChatError,
    EndChatUseCase,
};
use chat_service_domain::ChatId;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use tracing::warn;

/// What the loop should do after a slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandOutcome {
    Continue,
    Exit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    turns: ChatCompletionStreamUseCase,
    end_chat: EndChatUseCase,
    config: ChatCompletionConfig,
    user_id: String,
    chat_id: ChatId,
    repl: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(
        turns: ChatCompletionStreamUseCase,
        end_chat: EndChatUseCase,
        config: ChatCompletionConfig,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            turns,
            end_chat,
            config,
            user_id: user_id.into(),
            chat_id: ChatId::new(""),
            repl: ReplConfig::default(),
        }
    }

    /// Continue an existing session instead of starting a new one
    pub fn with_session(mut self, chat_id: impl Into<ChatId>) -> Self {
        self.chat_id = chat_id.into();
        self
    }

    pub fn with_repl_config(mut self, repl: ReplConfig) -> Self {
        self.repl = repl;
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.repl.show_progress = show;
        self
    }

    fn line_editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = self.repl.history_path() else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(self.repl.history_size, path) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("History disabled: {}", e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = self.line_editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("chat".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line).await == CommandOutcome::Exit {
                            break;
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          chat-service - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Model: {} ({} context tokens)",
            self.config.model, self.config.model_max_tokens
        );
        println!("Session: {}", self.session_label());
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?    - Show this help");
        println!("  /session         - Show the current session id");
        println!("  /new             - Start a new session");
        println!("  /end             - End the current session");
        println!("  /quit, /exit, /q - Exit chat");
        println!();
    }

    fn session_label(&self) -> String {
        if self.chat_id.is_empty() {
            "(new)".to_string()
        } else {
            self.chat_id.to_string()
        }
    }

    /// Handle slash commands.
    async fn handle_command(&mut self, cmd: &str) -> CommandOutcome {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                return CommandOutcome::Exit;
            }
            "/help" | "/h" | "/?" => {
                println!();
                Self::print_help();
            }
            "/session" => println!("Session: {}", self.session_label()),
            "/new" => {
                self.chat_id = ChatId::new("");
                println!("Next message starts a new session");
            }
            "/end" => self.end_session().await,
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        CommandOutcome::Continue
    }

    async fn end_session(&mut self) {
        if self.chat_id.is_empty() {
            println!("No session to end");
            return;
        }
        match self.end_chat.execute(&self.chat_id).await {
            Ok(chat) => {
                println!("{}", ConsoleFormatter::format_chat_summary(&chat));
                self.chat_id = ChatId::new("");
            }
            Err(EndChatError::NotFound(id)) => {
                println!("Session {} was never saved", id);
                self.chat_id = ChatId::new("");
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    async fn process_message(&mut self, message: &str) {
        println!();

        let input = ChatCompletionInput::new(
            self.chat_id.clone(),
            self.user_id.clone(),
            message,
            self.config.clone(),
        );
        let progress = ProgressReporter::new(self.repl.show_progress, &self.config.model);
        let mut printer = StreamPrinter::stdout();
        let handle = self.turns.spawn(input);

        let result = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                progress.finish();
                println!();
                println!("{}", ConsoleFormatter::format_error(
                    &chat_service_application::ChatCompletionError::Cancelled
                ));
                println!();
                return;
            }
            result = render_turn(handle, &mut printer, &progress) => result,
        };

        match result {
            Ok(output) => self.chat_id = output.chat_id,
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
        }
        println!();
    }
}
