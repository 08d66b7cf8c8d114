//! Terminal progress bar for batch resolution.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use mergeresolve_core::progress::ProgressHandle;

/// [`ProgressHandle`] drawing an `indicatif` spinner that turns into a bar
/// once the file count is known.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message("Collecting conflicts...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A handle that draws nothing, for JSON output.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressHandle for BarProgress {
    fn switch_to_determinate(&self, total: usize) {
        self.bar.set_length(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {wide_msg}") {
            self.bar.set_style(style);
        }
    }

    fn set_description(&self, description: &str) {
        self.bar.set_message(description.to_string());
    }

    fn progress(&self, done: usize) {
        self.bar.set_position(done as u64);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
