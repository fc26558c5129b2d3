//! Console output formatting for chat turns and sessions

use chat_service_application::{ChatCompletionError, ChatCompletionOutput};
use chat_service_domain::{Chat, ChatStatus};
use colored::Colorize;

/// Formats turn results and session summaries for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Footer printed after a streamed answer
    pub fn format_turn_footer(output: &ChatCompletionOutput) -> String {
        format!("{} {}", "session:".dimmed(), output.chat_id.as_str().dimmed())
    }

    /// Format a finished turn as JSON
    pub fn format_json(output: &ChatCompletionOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    /// Summary shown when a session is ended
    pub fn format_chat_summary(chat: &Chat) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Session Summary"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Session:".cyan().bold(), chat.id()));
        output.push_str(&format!("{} {}\n", "User:".cyan().bold(), chat.user_id()));
        output.push_str(&format!(
            "{} {}\n",
            "Model:".cyan().bold(),
            chat.config().model()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status_label(chat.status())
        ));
        output.push_str(&format!(
            "{} {} ({} evicted)\n",
            "Messages:".cyan().bold(),
            chat.count_messages(),
            chat.erased_messages().len()
        ));
        output.push_str(&format!(
            "{} {}/{}\n",
            "Tokens:".cyan().bold(),
            chat.token_usage(),
            chat.config().model().max_tokens()
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format a failed turn
    pub fn format_error(error: &ChatCompletionError) -> String {
        if error.is_cancelled() {
            format!("{}", "Interrupted".yellow())
        } else {
            format!("{} {}", "Error:".red().bold(), error)
        }
    }

    fn status_label(status: ChatStatus) -> String {
        match status {
            ChatStatus::Active => status.as_str().green().to_string(),
            ChatStatus::Ended => status.as_str().yellow().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(40);
        format!("{}\n{:^40}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        "=".repeat(40).cyan().to_string()
    }
}
