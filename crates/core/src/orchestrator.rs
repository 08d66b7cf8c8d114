//! Batch auto-resolution of conflicting files.
//!
//! [`AutoResolver`] walks a list of [`MergeData`], resolves every file whose
//! pairs are all NONE, SAME or RESOLVABLE, writes the result into the working
//! tree and stages it. Files that still need a manual decision stay in the
//! list with their classifications attached.
//!
//! # Per-file flow
//!
//! 1. Skip policy ([`ResolvePolicy`]); skipped files stay in the list.
//! 2. Classification ([`MergeData::mark_conflicting`]).
//! 3. Accept every pending delta of YOURS, then of THEIRS, on a clone.
//! 4. Normalize line endings, write, `add` through the [`Repository`].
//!
//! Errors are per file and the batch continues. A failed write is recorded
//! as [`FileOutcome::Failed`]; an offset inconsistency leaves the file
//! [`FileOutcome::StillConflicting`]. Either way the file stays in the list
//! with its classifications attached.
//!
//! [`AutoResolver::accept_version`] is the manual counterpart: it settles a
//! whole file by taking one side's version.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::conflict::{ConflictSide, ConflictSummary, MergeData};
use crate::diff::{ChangeKind, ChangeSide};
use crate::errors::{CoreError, MergeError, RepositoryError};
use crate::policy::{PolicyDecision, ResolvePolicy};
use crate::progress::{CancellationFlag, ProgressHandle};
use crate::repository::Repository;
use crate::resolve::ResolveOptionChain;
use crate::text::LineEnding;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of auto-resolving one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Written and staged (or, in a preview, would be).
    Resolved {
        path: String,
        line_ending: LineEnding,
        summary: ConflictSummary,
    },
    /// At least one pair needs a manual decision.
    StillConflicting { path: String, summary: ConflictSummary },
    /// Left alone by the skip policy.
    Skipped { path: String, decision: PolicyDecision },
    /// Resolution or staging failed; the file stays in the list.
    Failed { path: String, error: String },
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Resolved { path, .. }
            | Self::StillConflicting { path, .. }
            | Self::Skipped { path, .. }
            | Self::Failed { path, .. } => path,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolved { .. } => "resolved",
            Self::StillConflicting { .. } => "conflicting",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoResolveSummary {
    /// Number of files in the list when the batch started.
    pub total: usize,
    /// One entry per processed file, in processing order.
    pub files: Vec<FileOutcome>,
    /// The batch stopped early on request.
    pub cancelled: bool,
}

impl AutoResolveSummary {
    pub fn resolved(&self) -> usize {
        self.files.iter().filter(|f| f.is_resolved()).count()
    }

    /// Files that were processed but not resolved.
    pub fn remaining(&self) -> usize {
        self.files.len() - self.resolved()
    }
}

/// A file merged in memory, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: String,
    /// Merged content with line endings already normalized.
    pub text: String,
    pub line_ending: LineEnding,
    pub summary: ConflictSummary,
    /// The merge deletes the file; `text` is empty.
    pub deleted: bool,
}

/// What [`AutoResolver::accept_version`] did to the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VersionAction {
    /// The side's content was written and staged.
    Written { path: String },
    /// The side deleted the file; it was removed from the tree and index.
    Removed { path: String },
}

impl VersionAction {
    pub fn path(&self) -> &str {
        match self {
            Self::Written { path } | Self::Removed { path } => path,
        }
    }
}

/// Why [`AutoResolver::try_resolve`] did not produce a merge.
#[derive(Debug)]
pub enum Unresolved {
    Skipped(PolicyDecision),
    Conflicting(ConflictSummary),
    Failed(MergeError),
}

// ---------------------------------------------------------------------------
// AutoResolver
// ---------------------------------------------------------------------------

/// Applies a resolve-option chain to a batch of conflicting files.
#[derive(Debug)]
pub struct AutoResolver {
    chain: ResolveOptionChain,
    policy: ResolvePolicy,
    line_ending_fallback: LineEnding,
    cancel: CancellationFlag,
}

impl AutoResolver {
    pub fn new(chain: ResolveOptionChain, policy: ResolvePolicy) -> Self {
        Self {
            chain,
            policy,
            line_ending_fallback: LineEnding::platform(),
            cancel: CancellationFlag::new(),
        }
    }

    /// Line ending written when the two sides disagree.
    pub fn with_line_ending_fallback(mut self, fallback: LineEnding) -> Self {
        self.line_ending_fallback = fallback;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn chain(&self) -> &ResolveOptionChain {
        &self.chain
    }

    pub fn policy(&self) -> &ResolvePolicy {
        &self.policy
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Merge one file in memory without touching `merge` or the disk.
    pub fn try_resolve(&self, merge: &MergeData) -> Result<ResolvedFile, Unresolved> {
        let decision = self.policy.evaluate(merge);
        if !decision.is_allowed() {
            return Err(Unresolved::Skipped(decision));
        }

        let mut working = merge.clone();
        working.mark_conflicting(&self.chain);
        let summary = working.conflict_summary();
        if working.has_conflicting() {
            return Err(Unresolved::Conflicting(summary));
        }

        working
            .accept_side(ConflictSide::Yours, &self.chain)
            .and_then(|_| working.accept_side(ConflictSide::Theirs, &self.chain))
            .map_err(Unresolved::Failed)?;

        let line_ending = working.line_ending(self.line_ending_fallback);
        let deleted = working.merged_text().is_empty()
            && [ConflictSide::Yours, ConflictSide::Theirs]
                .iter()
                .any(|&side| working.diff(side).header().kind == ChangeKind::Delete);
        Ok(ResolvedFile {
            path: working.file_path(),
            text: line_ending.normalize(working.merged_text()),
            line_ending,
            summary,
            deleted,
        })
    }

    /// Settle a whole file by taking `side`'s version.
    ///
    /// The side's NEW text is written and staged, or, when that side
    /// deleted the file, the file is removed from the tree and the index.
    /// The side's pending deltas are marked applied and the other side's
    /// discarded, so the caller can drop `merge` from its list.
    #[instrument(skip_all, fields(path = %merge.file_path(), side = %side))]
    pub fn accept_version(
        &self,
        merge: &mut MergeData,
        side: ConflictSide,
        repo: &dyn Repository,
    ) -> Result<VersionAction, CoreError> {
        let diff = merge.diff(side);
        let header = diff.header();
        let action = if header.kind == ChangeKind::Delete {
            let path = header.old_path.clone().unwrap_or_else(|| merge.file_path());
            repo.remove(std::slice::from_ref(&path))?;
            VersionAction::Removed { path }
        } else {
            let path = header.path().to_string();
            let full = repo.top_level_directory().join(&path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).map_err(RepositoryError::IoError)?;
            }
            std::fs::write(&full, diff.text(ChangeSide::New)).map_err(RepositoryError::IoError)?;
            repo.add(std::slice::from_ref(&path))?;
            VersionAction::Written { path }
        };

        merge.settle_side(side)?;
        info!(path = action.path(), "accepted whole version");
        Ok(action)
    }

    /// Report what [`perform_auto_resolve`](Self::perform_auto_resolve)
    /// would do, without writing anything.
    pub fn preview(&self, merges: &[MergeData]) -> AutoResolveSummary {
        AutoResolveSummary {
            total: merges.len(),
            files: merges.iter().map(|merge| self.outcome_of(merge).0).collect(),
            cancelled: false,
        }
    }

    /// Resolve, write and stage every file that needs no manual decision,
    /// removing it from `merges`.
    ///
    /// The list is walked from the end so removals keep earlier indices
    /// valid. Cancellation is checked before each file.
    #[instrument(skip_all, fields(files = merges.len()))]
    pub fn perform_auto_resolve(
        &self,
        merges: &mut Vec<MergeData>,
        repo: &dyn Repository,
        progress: &dyn ProgressHandle,
    ) -> AutoResolveSummary {
        let total = merges.len();
        let mut summary = AutoResolveSummary {
            total,
            ..Default::default()
        };
        progress.switch_to_determinate(total);

        for (done, index) in (0..total).rev().enumerate() {
            if self.cancel.is_cancelled() {
                info!(processed = done, total, "auto-resolve cancelled");
                summary.cancelled = true;
                break;
            }

            let path = merges[index].file_path();
            progress.set_description(&path);

            let (outcome, resolved) = self.outcome_of(&merges[index]);
            let outcome = match resolved {
                Some(file) => match write_resolved(repo, &file) {
                    Ok(()) => {
                        merges.remove(index);
                        info!(path = %path, "resolved and staged");
                        outcome
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "failed to write resolved file");
                        merges[index].mark_conflicting(&self.chain);
                        FileOutcome::Failed {
                            path,
                            error: e.to_string(),
                        }
                    }
                },
                None => {
                    if !matches!(outcome, FileOutcome::Skipped { .. }) {
                        // Keep annotations for manual review.
                        merges[index].mark_conflicting(&self.chain);
                    }
                    outcome
                }
            };
            summary.files.push(outcome);
            progress.progress(done + 1);
        }

        progress.finish();
        info!(
            "Auto-resolve managed to resolve {} of {} conflicts",
            summary.resolved(),
            total
        );
        summary
    }

    fn outcome_of(&self, merge: &MergeData) -> (FileOutcome, Option<ResolvedFile>) {
        let path = merge.file_path();
        match self.try_resolve(merge) {
            Ok(file) => (
                FileOutcome::Resolved {
                    path,
                    line_ending: file.line_ending,
                    summary: file.summary,
                },
                Some(file),
            ),
            Err(Unresolved::Skipped(decision)) => {
                debug!(path = %path, decision = decision.label(), "skipped by policy");
                (FileOutcome::Skipped { path, decision }, None)
            }
            Err(Unresolved::Conflicting(summary)) => {
                debug!(path = %path, conflicting = summary.conflicting, "needs manual resolution");
                (FileOutcome::StillConflicting { path, summary }, None)
            }
            Err(Unresolved::Failed(e @ MergeError::OffsetInconsistency { .. })) => {
                warn!(path = %path, error = %e, "offsets inconsistent, leaving file for manual resolution");
                let mut classified = merge.clone();
                classified.mark_conflicting(&self.chain);
                let summary = classified.conflict_summary();
                (FileOutcome::StillConflicting { path, summary }, None)
            }
            Err(Unresolved::Failed(e)) => {
                warn!(path = %path, error = %e, "auto-resolve failed");
                (
                    FileOutcome::Failed {
                        path,
                        error: e.to_string(),
                    },
                    None,
                )
            }
        }
    }
}

fn write_resolved(repo: &dyn Repository, file: &ResolvedFile) -> Result<(), CoreError> {
    if file.deleted {
        repo.remove(std::slice::from_ref(&file.path))?;
        return Ok(());
    }
    let full = repo.top_level_directory().join(&file.path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).map_err(RepositoryError::IoError)?;
    }
    std::fs::write(&full, &file.text).map_err(RepositoryError::IoError)?;
    repo.add(std::slice::from_ref(&file.path))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
