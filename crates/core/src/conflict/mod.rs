//! Conflict pairing and per-file merge state.
//!
//! The conflict subsystem is responsible for:
//! 1. **Pairing** -- sweeping the YOURS and THEIRS delta sequences of one file
//!    for overlapping edits and classifying every overlapping pair.
//! 2. **Merge state** -- [`MergeData`] owns both diffs and applies accepted,
//!    discarded and resolved deltas to the shared merge buffer.

pub mod detector;
pub mod merge_data;

use std::fmt;

use serde::Serialize;

pub use detector::{overlapping_pairs, ConflictDetector};
pub use merge_data::{ConflictSummary, MergeData};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which of the two diffs of a merge a delta belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSide {
    Yours,
    Theirs,
}

impl ConflictSide {
    pub fn other(&self) -> Self {
        match self {
            ConflictSide::Yours => ConflictSide::Theirs,
            ConflictSide::Theirs => ConflictSide::Yours,
        }
    }
}

impl fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yours => write!(f, "yours"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// Classification of a pair of overlapping deltas, and of each delta after
/// pairing (the most severe classification among its pairs).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// No overlapping counterpart.
    #[default]
    None,
    /// Identical edit on both sides.
    Same,
    /// Different edits that the named resolve option can reconcile.
    Resolvable(&'static str),
    /// Needs a manual decision.
    Conflicting,
}

impl ConflictType {
    /// Ordering used when a delta takes part in several pairs.
    pub fn severity(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Same => 1,
            Self::Resolvable(_) => 2,
            Self::Conflicting => 3,
        }
    }

    pub fn is_conflicting(&self) -> bool {
        matches!(self, Self::Conflicting)
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Same => write!(f, "same"),
            Self::Resolvable(option) => write!(f, "resolvable ({})", option),
            Self::Conflicting => write!(f, "conflicting"),
        }
    }
}

/// Delta `yours` of the YOURS diff collides with delta `theirs` of the
/// THEIRS diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictPair {
    pub yours: usize,
    pub theirs: usize,
    pub conflict: ConflictType,
}

impl ConflictPair {
    /// Index of the delta on `side`.
    pub fn index(&self, side: ConflictSide) -> usize {
        match side {
            ConflictSide::Yours => self.yours,
            ConflictSide::Theirs => self.theirs,
        }
    }
}
