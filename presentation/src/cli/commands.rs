//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Stream the answer as it arrives
    Text,
    /// Print the final result as JSON
    Json,
}

/// CLI arguments for chat-service
#[derive(Parser, Debug)]
#[command(name = "chat-service")]
#[command(author, version, about = "Token-budgeted streaming chat sessions")]
#[command(long_about = r#"
chat-service keeps persistent chat sessions within a model's context budget.
Each turn streams the assistant's answer; when the history no longer fits,
the oldest turns are evicted.

Configuration files are loaded from (in priority order):
1. CHAT_SERVICE_* environment variables (e.g. CHAT_SERVICE_MODEL__NAME)
2. --config <path>                          Explicit config file
3. ./chat-service.toml                      Project-level config
4. ~/.config/chat-service/config.toml       Global config

Example:
  chat-service "Explain ownership in one paragraph"
  chat-service --session rust-notes "And borrowing?"
  chat-service --chat --model gpt-4o --max-context 8000
  chat-service --end --session rust-notes
"#)]
pub struct Cli {
    /// Message to send (not required in chat mode)
    pub message: Option<String>,

    /// Session to continue; a new one is created if it does not exist
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// User the session belongs to
    #[arg(short, long, value_name = "ID", default_value = "local")]
    pub user: String,

    /// Model for new sessions
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Context-token budget for new sessions
    #[arg(long, value_name = "TOKENS")]
    pub max_context: Option<usize>,

    /// Sampling temperature for new sessions (0.0 - 2.0)
    #[arg(short, long, value_name = "T")]
    pub temperature: Option<f32>,

    /// Initial system message for new sessions
    #[arg(long, value_name = "TEXT")]
    pub system: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// End the session given by --session
    #[arg(long, requires = "session")]
    pub end: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Log filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
