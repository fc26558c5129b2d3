//! Incremental printing of cumulative turn events.
//!
//! Every event of a turn carries the whole answer so far. The printer keeps
//! track of what is already on screen and writes only the new suffix.

use crate::progress::reporter::ProgressReporter;
use chat_service_application::{ChatCompletionError, ChatCompletionOutput, TurnHandle};
use std::io::{self, Write};
use tracing::warn;

/// Writes the unseen tail of cumulative text to `W`.
pub struct StreamPrinter<W: Write> {
    out: W,
    printed: usize,
}

impl StreamPrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    /// Bytes of the current answer already written.
    pub fn printed(&self) -> usize {
        self.printed
    }

    /// Print whatever `content` adds to what was printed before.
    ///
    /// Content that does not extend the previous text is printed whole on
    /// a fresh line.
    pub fn print(&mut self, content: &str) -> io::Result<()> {
        let tail = match content.get(self.printed..) {
            Some(tail) if content.len() >= self.printed => tail,
            _ => {
                writeln!(self.out)?;
                content
            }
        };
        if tail.is_empty() {
            return Ok(());
        }
        self.out.write_all(tail.as_bytes())?;
        self.out.flush()?;
        self.printed = content.len();
        Ok(())
    }

    /// Terminate the answer with a newline and get ready for the next one.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.printed > 0 {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        self.printed = 0;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Drive a running turn to completion, printing its text as it arrives.
///
/// The spinner is cleared as soon as the first fragment shows up.
pub async fn render_turn<W: Write>(
    mut handle: TurnHandle,
    printer: &mut StreamPrinter<W>,
    progress: &ProgressReporter,
) -> Result<ChatCompletionOutput, ChatCompletionError> {
    while let Some(event) = handle.next_event().await {
        progress.finish();
        if let Err(e) = printer.print(&event.content) {
            warn!("Failed to write answer: {}", e);
        }
    }
    progress.finish();
    if let Err(e) = printer.finish() {
        warn!("Failed to write answer: {}", e);
    }
    handle.finish().await
}
