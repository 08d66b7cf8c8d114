//! Skip policy for automatic resolution.
//!
//! Provides [`ResolvePolicy`] which encapsulates the `[auto_resolve]` limits
//! and exclude patterns and decides, per conflicting file, whether the
//! orchestrator may touch it.
//!
//! # Decision model
//!
//! | Condition | Decision |
//! |-----------|----------|
//! | Path matches an exclude pattern | `Excluded` |
//! | A text exceeds `max_file_chars` and `max_changed_lines` is 0 | `Huge` |
//! | A text exceeds `max_file_chars` and more than `max_changed_lines` lines changed | `Huge` |
//! | None of the above | `Allow` |

use serde::Serialize;
use tracing::{debug, warn};

use crate::conflict::MergeData;

pub const DEFAULT_MAX_FILE_CHARS: usize = 80_000;
pub const DEFAULT_MAX_CHANGED_LINES: usize = 50;

// ---------------------------------------------------------------------------
// Decision enum
// ---------------------------------------------------------------------------

/// The outcome of evaluating a file against the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PolicyDecision {
    /// Auto-resolution may run.
    Allow,
    /// The path matches an exclude pattern.
    Excluded { pattern: String },
    /// The file is too large and changed too much.
    Huge { chars: usize, changed_lines: usize },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Short human-readable label for logging and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Excluded { .. } => "excluded",
            Self::Huge { .. } => "huge",
        }
    }
}

// ---------------------------------------------------------------------------
// ResolvePolicy
// ---------------------------------------------------------------------------

/// Evaluates conflicting files against size limits and exclude patterns.
#[derive(Debug, Clone)]
pub struct ResolvePolicy {
    max_file_chars: usize,
    /// 0 means any file above `max_file_chars` is skipped.
    max_changed_lines: usize,
    /// Glob patterns matched against the repository-relative path.
    exclude: Vec<String>,
}

impl ResolvePolicy {
    pub fn new(max_file_chars: usize, max_changed_lines: usize, exclude: Vec<String>) -> Self {
        Self {
            max_file_chars,
            max_changed_lines,
            exclude,
        }
    }

    /// Evaluate a file with the given size and changed-line count.
    pub fn evaluate_sizes(&self, path: &str, chars: usize, changed_lines: usize) -> PolicyDecision {
        let normalized = path.replace('\\', "/");
        if let Some(pattern) = self
            .exclude
            .iter()
            .find(|pattern| glob_match::glob_match(&pattern.replace('\\', "/"), &normalized))
        {
            debug!(path, pattern = pattern.as_str(), "file matches exclude pattern");
            return PolicyDecision::Excluded {
                pattern: pattern.clone(),
            };
        }

        if chars > self.max_file_chars
            && (self.max_changed_lines == 0 || changed_lines > self.max_changed_lines)
        {
            warn!(
                path,
                chars,
                changed_lines,
                limit = self.max_file_chars,
                "file too large for auto-resolve, skipping"
            );
            return PolicyDecision::Huge {
                chars,
                changed_lines,
            };
        }

        PolicyDecision::Allow
    }

    /// Evaluate one merge.
    pub fn evaluate(&self, merge: &MergeData) -> PolicyDecision {
        self.evaluate_sizes(&merge.file_path(), merge.max_text_chars(), merge.changed_line_count())
    }

    pub fn max_file_chars(&self) -> usize {
        self.max_file_chars
    }

    pub fn max_changed_lines(&self) -> usize {
        self.max_changed_lines
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_CHARS, DEFAULT_MAX_CHANGED_LINES, Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
