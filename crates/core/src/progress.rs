//! Progress reporting and cooperative cancellation for batch resolution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives progress while a batch of files is processed.
///
/// Every method defaults to doing nothing, and resolution outcomes never
/// depend on the handle.
pub trait ProgressHandle: Send + Sync {
    /// Switch from an indeterminate spinner to a bar with `total` steps.
    fn switch_to_determinate(&self, _total: usize) {}

    fn set_description(&self, _description: &str) {}

    /// Report that `done` of the total steps are complete.
    fn progress(&self, _done: usize) {}

    fn finish(&self) {}
}

/// Handle that discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressHandle for NoopProgress {}

/// Shared flag asking a running batch to stop before its next file.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let worker = flag.clone();
        assert!(!worker.is_cancelled());
        flag.cancel();
        assert!(worker.is_cancelled());
    }

    #[test]
    fn test_noop_progress_accepts_calls() {
        let progress: &dyn ProgressHandle = &NoopProgress;
        progress.switch_to_determinate(3);
        progress.set_description("working");
        progress.progress(1);
        progress.finish();
    }
}
