//! Translate raw line edits into [`ChangeDelta`]s.
//!
//! The line diff itself comes from a [`LineDiffer`]. The default
//! [`SimilarLineDiffer`] runs `similar` over `\n`-terminated line slices;
//! any other implementation only has to return edits that are ordered and
//! cover both texts.

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};
use tracing::debug;

use super::delta::{ChangeDelta, DeltaRange};
use crate::text::{line_starts, offset_of_line, split_lines};

// ---------------------------------------------------------------------------
// Line edits
// ---------------------------------------------------------------------------

/// One region where OLD lines `[old_start, old_end)` became NEW lines
/// `[new_start, new_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    pub old_start: usize,
    pub old_end: usize,
    pub new_start: usize,
    pub new_end: usize,
}

/// Source of line-level edits between two texts.
pub trait LineDiffer: Send + Sync {
    /// Ordered, non-adjacent edits turning `old` into `new`.
    fn line_edits(&self, old: &str, new: &str) -> Vec<LineEdit>;
}

/// Diff algorithm used by [`SimilarLineDiffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(value: DiffAlgorithm) -> Self {
        match value {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        }
    }
}

/// [`LineDiffer`] backed by the `similar` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarLineDiffer {
    algorithm: DiffAlgorithm,
}

impl SimilarLineDiffer {
    pub fn new(algorithm: DiffAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl LineDiffer for SimilarLineDiffer {
    fn line_edits(&self, old: &str, new: &str) -> Vec<LineEdit> {
        let old_lines = split_lines(old);
        let new_lines = split_lines(new);
        let ops = capture_diff_slices(self.algorithm.into(), &old_lines, &new_lines);

        // Adjacent non-equal ops (delete followed by insert) form one edit.
        let mut edits: Vec<LineEdit> = Vec::new();
        for op in ops {
            if op.tag() == DiffTag::Equal {
                continue;
            }
            let (old_range, new_range) = (op.old_range(), op.new_range());
            match edits.last_mut() {
                Some(last) if last.old_end == old_range.start && last.new_end == new_range.start => {
                    last.old_end = old_range.end;
                    last.new_end = new_range.end;
                }
                _ => edits.push(LineEdit {
                    old_start: old_range.start,
                    old_end: old_range.end,
                    new_start: new_range.start,
                    new_end: new_range.end,
                }),
            }
        }
        edits
    }
}

// ---------------------------------------------------------------------------
// Delta construction
// ---------------------------------------------------------------------------

/// Build the delta sequence for `edits` by scanning cumulative line lengths
/// of both texts.
pub fn build_deltas(old: &str, new: &str, edits: &[LineEdit]) -> Vec<ChangeDelta> {
    let old_starts = line_starts(old);
    let new_starts = line_starts(new);

    let deltas: Vec<ChangeDelta> = edits
        .iter()
        .map(|edit| {
            let old_range = DeltaRange::new(
                edit.old_start,
                edit.old_end,
                offset_of_line(&old_starts, edit.old_start),
                offset_of_line(&old_starts, edit.old_end),
            );
            let new_range = DeltaRange::new(
                edit.new_start,
                edit.new_end,
                offset_of_line(&new_starts, edit.new_start),
                offset_of_line(&new_starts, edit.new_end),
            );
            ChangeDelta::from_ranges(old_range, new_range)
        })
        .collect();

    debug!(edits = edits.len(), "built change deltas");
    deltas
}
