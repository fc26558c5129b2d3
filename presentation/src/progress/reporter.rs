//! Progress reporting while a turn waits for its first fragment

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown between sending a message and the first streamed text
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Start a spinner labelled with the model being queried.
    pub fn waiting(model: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_message(format!("Waiting for {}...", model));
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A reporter that never draws anything (quiet mode, JSON output).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn new(show: bool, model: &str) -> Self {
        if show {
            Self::waiting(model)
        } else {
            Self::hidden()
        }
    }

    /// Remove the spinner. Safe to call more than once.
    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_is_idempotent() {
        let progress = ProgressReporter::hidden();
        progress.finish();
        progress.finish();
        assert!(progress.bar.is_finished());
    }
}
