//! The [`ChangeDelta`] record: one contiguous edit region of a file diff.

use std::ops::Range;

use serde::Serialize;

use super::{ChangeKind, ChangeSide, ChangeStatus};
use crate::conflict::ConflictType;

/// Line and byte range of a delta on one side.
///
/// Lines are half-open `[start_line, end_line)`; bytes are half-open
/// `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaRange {
    pub start_line: usize,
    pub end_line: usize,
    pub start: usize,
    pub end: usize,
}

impl DeltaRange {
    pub fn new(start_line: usize, end_line: usize, start: usize, end: usize) -> Self {
        Self {
            start_line,
            end_line,
            start,
            end,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }
}

/// One contiguous edit region within a single-file diff.
///
/// Text is not stored on the delta; it is read from the owning
/// [`FileDiff`](super::FileDiff) so that offsets and content can never drift
/// apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDelta {
    kind: ChangeKind,
    status: ChangeStatus,
    conflict: ConflictType,
    old: DeltaRange,
    new: DeltaRange,
}

impl ChangeDelta {
    pub(crate) fn new(kind: ChangeKind, old: DeltaRange, new: DeltaRange) -> Self {
        Self {
            kind,
            status: ChangeStatus::Pending,
            conflict: ConflictType::None,
            old,
            new,
        }
    }

    /// Build a delta from its ranges, deriving the kind from which side is
    /// empty.
    pub(crate) fn from_ranges(old: DeltaRange, new: DeltaRange) -> Self {
        let kind = match (old.line_count() == 0, new.line_count() == 0) {
            (true, _) => ChangeKind::Add,
            (false, true) => ChangeKind::Delete,
            (false, false) => ChangeKind::Modify,
        };
        Self::new(kind, old, new)
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChangeStatus::Pending
    }

    pub fn conflict_type(&self) -> ConflictType {
        self.conflict
    }

    pub fn range(&self, side: ChangeSide) -> &DeltaRange {
        match side {
            ChangeSide::Old => &self.old,
            ChangeSide::New => &self.new,
        }
    }

    /// Byte span on `side`.
    pub fn span(&self, side: ChangeSide) -> Range<usize> {
        self.range(side).span()
    }

    /// Slice this delta's text out of `source`, which must be the current
    /// text of `side` in the owning diff.
    pub fn text<'a>(&self, side: ChangeSide, source: &'a str) -> &'a str {
        let span = self.span(side);
        source.get(span).unwrap_or("")
    }

    pub(crate) fn range_mut(&mut self, side: ChangeSide) -> &mut DeltaRange {
        match side {
            ChangeSide::Old => &mut self.old,
            ChangeSide::New => &mut self.new,
        }
    }

    pub(crate) fn set_status(&mut self, status: ChangeStatus) {
        self.status = status;
    }

    pub(crate) fn set_conflict_type(&mut self, conflict: ConflictType) {
        self.conflict = conflict;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_ranges() {
        let empty = DeltaRange::new(1, 1, 2, 2);
        let line = DeltaRange::new(1, 2, 2, 4);
        assert_eq!(ChangeDelta::from_ranges(empty, line).kind(), ChangeKind::Add);
        assert_eq!(ChangeDelta::from_ranges(line, empty).kind(), ChangeKind::Delete);
        assert_eq!(ChangeDelta::from_ranges(line, line).kind(), ChangeKind::Modify);
    }

    #[test]
    fn test_text_slices_source() {
        let delta = ChangeDelta::from_ranges(DeltaRange::new(1, 2, 2, 4), DeltaRange::new(1, 2, 2, 4));
        assert_eq!(delta.text(ChangeSide::Old, "a\nb\nc\n"), "b\n");
        assert!(delta.is_pending());
        assert_eq!(delta.conflict_type(), ConflictType::None);
    }
}
