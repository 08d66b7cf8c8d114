//! [`MergeData`]: the YOURS and THEIRS diffs of one conflicting file.
//!
//! Both diffs start from the same BASE text. That OLD text is the shared
//! merge buffer: every OLD-side change made through this type is applied to
//! both diffs, so their OLD texts never diverge and the merged file is
//! simply the OLD text of either diff.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::detector::ConflictDetector;
use super::{ConflictPair, ConflictSide, ConflictType};
use crate::diff::{
    ChangeKind, ChangeSide, ChangeStatus, DeltaTextChangeEvent, FileDiff, FileDiffHeader, LineDiffer,
};
use crate::errors::MergeError;
use crate::resolve::{ConflictContext, ResolveOption, ResolveOptionChain, SameResolveOption};
use crate::text::LineEnding;

/// Delta counts per classification across both sides of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConflictSummary {
    pub none: usize,
    pub same: usize,
    pub resolvable: usize,
    pub conflicting: usize,
}

/// Two diffs against the same base version of one file.
#[derive(Debug, Clone)]
pub struct MergeData {
    yours: FileDiff,
    theirs: FileDiff,
    pairs: Vec<ConflictPair>,
}

impl MergeData {
    pub fn new(yours: FileDiff, theirs: FileDiff) -> Self {
        Self {
            yours,
            theirs,
            pairs: Vec::new(),
        }
    }

    /// Diff both versions of `path` against `base`.
    pub fn from_versions(
        path: &str,
        base: &str,
        yours: &str,
        theirs: &str,
        differ: &dyn LineDiffer,
    ) -> Self {
        let header = FileDiffHeader::modified(path);
        Self::new(
            FileDiff::new(header.clone(), base, yours, differ),
            FileDiff::new(header, base, theirs, differ),
        )
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn diff(&self, side: ConflictSide) -> &FileDiff {
        match side {
            ConflictSide::Yours => &self.yours,
            ConflictSide::Theirs => &self.theirs,
        }
    }

    fn diff_mut(&mut self, side: ConflictSide) -> &mut FileDiff {
        match side {
            ConflictSide::Yours => &mut self.yours,
            ConflictSide::Theirs => &mut self.theirs,
        }
    }

    /// Repository-relative path of the merged file.
    ///
    /// Takes the side that did not rename the file; when both renamed it,
    /// THEIRS decides.
    pub fn file_path(&self) -> String {
        let yours = self.yours.header();
        let theirs = self.theirs.header();
        let path = match (yours.kind == ChangeKind::Rename, theirs.kind == ChangeKind::Rename) {
            (false, _) => yours.path(),
            (true, false) => theirs.path(),
            (true, true) if yours.old_path == theirs.old_path => {
                theirs.old_path.as_deref().unwrap_or_else(|| theirs.path())
            }
            (true, true) => theirs.path(),
        };
        path.to_string()
    }

    /// Pairs found by the last [`mark_conflicting`](Self::mark_conflicting).
    pub fn conflict_pairs(&self) -> &[ConflictPair] {
        &self.pairs
    }

    /// Current merge result: the shared OLD text.
    pub fn merged_text(&self) -> &str {
        self.yours.text(ChangeSide::Old)
    }

    /// The BASE text both diffs started from.
    pub fn base_text(&self) -> &str {
        self.yours.original_text(ChangeSide::Old)
    }

    /// Unified diff from BASE to the current merge result.
    pub fn merged_patch(&self) -> String {
        diffy::create_patch(self.base_text(), self.merged_text()).to_string()
    }

    /// Line ending for the written file: the one both NEW sides use, or
    /// `fallback` when they differ.
    pub fn line_ending(&self, fallback: LineEnding) -> LineEnding {
        LineEnding::for_merge(
            self.yours.content_info(ChangeSide::New).line_ending,
            self.theirs.content_info(ChangeSide::New).line_ending,
            fallback,
        )
    }

    /// Total changed lines over both diffs.
    pub fn changed_line_count(&self) -> usize {
        self.yours.changed_line_count() + self.theirs.changed_line_count()
    }

    /// Character count of the longest of the BASE, YOURS and THEIRS texts.
    pub fn max_text_chars(&self) -> usize {
        [
            self.base_text(),
            self.yours.original_text(ChangeSide::New),
            self.theirs.original_text(ChangeSide::New),
        ]
        .iter()
        .map(|text| text.chars().count())
        .max()
        .unwrap_or(0)
    }

    /// The side that deleted the file while the other side changed it.
    ///
    /// Such a file conflicts as a whole: the deletion and the edits never
    /// need to overlap line by line.
    pub fn deleted_side(&self) -> Option<ConflictSide> {
        let deleted = |diff: &FileDiff| diff.header().kind == ChangeKind::Delete;
        match (deleted(&self.yours), deleted(&self.theirs)) {
            (true, false) if !self.theirs.deltas().is_empty() => Some(ConflictSide::Yours),
            (false, true) if !self.yours.deltas().is_empty() => Some(ConflictSide::Theirs),
            _ => None,
        }
    }

    /// Whether the file needs a manual decision: a delete/modify conflict,
    /// or any delta on either side classified CONFLICTING.
    pub fn has_conflicting(&self) -> bool {
        self.deleted_side().is_some()
            || [&self.yours, &self.theirs]
                .iter()
                .flat_map(|diff| diff.deltas())
                .any(|delta| delta.conflict_type().is_conflicting())
    }

    /// Whether every delta on both sides has been applied or discarded.
    pub fn is_fully_resolved(&self) -> bool {
        [&self.yours, &self.theirs]
            .iter()
            .flat_map(|diff| diff.deltas())
            .all(|delta| !delta.is_pending())
    }

    pub fn conflict_summary(&self) -> ConflictSummary {
        let mut summary = ConflictSummary::default();
        for delta in self.yours.deltas().iter().chain(self.theirs.deltas()) {
            match delta.conflict_type() {
                ConflictType::None => summary.none += 1,
                ConflictType::Same => summary.same += 1,
                ConflictType::Resolvable(_) => summary.resolvable += 1,
                ConflictType::Conflicting => summary.conflicting += 1,
            }
        }
        summary
    }

    /// View of one pair for resolve options.
    pub fn context(&self, pair: &ConflictPair) -> Result<ConflictContext<'_>, MergeError> {
        ConflictContext::new(&self.yours, &self.theirs, pair.yours, pair.theirs)
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// Pair and classify all deltas, replacing any earlier classification.
    ///
    /// In a delete/modify conflict every delta of one side is paired with
    /// every delta of the other and all pairs are CONFLICTING.
    pub fn mark_conflicting(&mut self, chain: &ResolveOptionChain) -> &[ConflictPair] {
        let pairs = match self.deleted_side() {
            Some(side) => {
                warn!(path = %self.file_path(), deleted_by = %side, "file deleted on one side and changed on the other");
                self.whole_file_pairs()
            }
            None => ConflictDetector::new(chain).detect(&self.yours, &self.theirs),
        };

        for diff in [&mut self.yours, &mut self.theirs] {
            for index in 0..diff.deltas().len() {
                if let Ok(delta) = diff.delta_mut(index) {
                    delta.set_conflict_type(ConflictType::None);
                }
            }
        }
        for pair in &pairs {
            for side in [ConflictSide::Yours, ConflictSide::Theirs] {
                if let Ok(delta) = self.diff_mut(side).delta_mut(pair.index(side)) {
                    if pair.conflict.severity() > delta.conflict_type().severity() {
                        delta.set_conflict_type(pair.conflict);
                    }
                }
            }
        }

        self.pairs = pairs;
        &self.pairs
    }

    fn whole_file_pairs(&self) -> Vec<ConflictPair> {
        let theirs_len = self.theirs.deltas().len();
        (0..self.yours.deltas().len())
            .flat_map(|yours| {
                (0..theirs_len).map(move |theirs| ConflictPair {
                    yours,
                    theirs,
                    conflict: ConflictType::Conflicting,
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Replace `[offset, offset + length)` of the merge buffer with `text`,
    /// as a user edit, in both diffs.
    ///
    /// Deltas overlapping the edit absorb it; later deltas shift. Nothing
    /// changes if either diff rejects the edit.
    pub fn modify_text(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
    ) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let event = DeltaTextChangeEvent::from_user(ChangeSide::Old, offset, length, text);
        let mut yours = self.yours.clone();
        let mut theirs = self.theirs.clone();
        yours.process_text_event(&event)?;
        theirs.process_text_event(&event)?;
        if yours.text(ChangeSide::Old) != theirs.text(ChangeSide::Old) {
            return Err(MergeError::OffsetInconsistency {
                side: ChangeSide::Old,
                detail: format!("merge buffers diverged after edit at {}", offset),
            });
        }

        self.yours = yours;
        self.theirs = theirs;
        debug!(path = %self.file_path(), offset, length, inserted = text.len(), "merge buffer edited");
        Ok(vec![event])
    }

    /// Accept the delta at `index` on `side` into the merge buffer.
    ///
    /// - SAME and RESOLVABLE pairs are merged by their resolve option, which
    ///   marks both deltas applied.
    /// - A CONFLICTING delta whose counterpart was already applied is
    ///   appended after the counterpart's text.
    /// - Anything else replaces its OLD span with its NEW text.
    pub fn accept_delta(
        &mut self,
        side: ConflictSide,
        index: usize,
        chain: &ResolveOptionChain,
    ) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        if !self.diff(side).delta(index)?.is_pending() {
            debug!(%side, index, "delta already handled, skipping accept");
            return Ok(Vec::new());
        }

        let pair = self.pairs.iter().find(|p| p.index(side) == index).copied();
        match pair {
            Some(pair) if pair.conflict == ConflictType::Same => {
                let option: &dyn ResolveOption = chain
                    .get(crate::resolve::same::NAME)
                    .unwrap_or(&SameResolveOption);
                option.resolve(self, &pair)
            }
            Some(pair) => match pair.conflict {
                ConflictType::Resolvable(name) => {
                    let option = chain
                        .get(name)
                        .ok_or_else(|| MergeError::UnknownResolveOption(name.to_string()))?;
                    option.resolve(self, &pair)
                }
                ConflictType::Conflicting
                    if self.diff(side.other()).delta(pair.index(side.other()))?.status()
                        == ChangeStatus::Applied =>
                {
                    self.append_delta(side, index)
                }
                _ => self.accept_plain(side, index),
            },
            None => self.accept_plain(side, index),
        }
    }

    /// Accept every pending, non-conflicting delta of `side`.
    pub fn accept_side(
        &mut self,
        side: ConflictSide,
        chain: &ResolveOptionChain,
    ) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let mut events = Vec::new();
        for index in 0..self.diff(side).deltas().len() {
            let delta = self.diff(side).delta(index)?;
            if delta.is_pending() && !delta.conflict_type().is_conflicting() {
                events.extend(self.accept_delta(side, index, chain)?);
            }
        }
        Ok(events)
    }

    /// Drop the delta at `index` on `side`.
    pub fn discard_delta(&mut self, side: ConflictSide, index: usize) -> Result<(), MergeError> {
        self.diff_mut(side).discard_delta(index)
    }

    /// Replace the union of a pair's OLD ranges with `merged` in both diffs
    /// and mark both deltas applied. Nothing changes if either diff rejects
    /// the edit.
    pub fn apply_resolution(
        &mut self,
        pair: &ConflictPair,
        merged: &str,
    ) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let span = self.context(pair)?.union_span();
        let event = DeltaTextChangeEvent::new(ChangeSide::Old, span.start, span.len(), merged);

        let mut yours = self.yours.clone();
        let mut theirs = self.theirs.clone();
        yours.process_text_event(&event)?;
        theirs.process_text_event(&event)?;
        yours.set_resolved(pair.yours)?;
        theirs.set_resolved(pair.theirs)?;

        self.yours = yours;
        self.theirs = theirs;
        debug!(
            path = %self.file_path(),
            yours = pair.yours,
            theirs = pair.theirs,
            offset = span.start,
            "pair resolved"
        );
        Ok(vec![event])
    }

    /// Record that `side` was taken as a whole: its pending deltas become
    /// applied and the other side's pending deltas discarded. The merge
    /// buffer is left as it is.
    pub fn settle_side(&mut self, side: ConflictSide) -> Result<(), MergeError> {
        for (target, accept) in [(side, true), (side.other(), false)] {
            for index in 0..self.diff(target).deltas().len() {
                if !self.diff(target).delta(index)?.is_pending() {
                    continue;
                }
                if accept {
                    self.diff_mut(target).set_resolved(index)?;
                } else {
                    self.diff_mut(target).discard_delta(index)?;
                }
            }
        }
        Ok(())
    }

    /// Restore both diffs to their initial state and drop classifications.
    pub fn reset(&mut self) {
        self.yours.reset();
        self.theirs.reset();
        self.pairs.clear();
        info!(path = %self.file_path(), "merge state reset");
    }

    /// Write the delta's NEW text over its OLD span in both diffs.
    fn accept_plain(&mut self, side: ConflictSide, index: usize) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let mut own = self.diff(side).clone();
        let mut other = self.diff(side.other()).clone();
        let events = own.accept_delta(index)?;
        for event in &events {
            other.process_text_event(event)?;
        }
        *self.diff_mut(side) = own;
        *self.diff_mut(side.other()) = other;
        Ok(events)
    }

    /// Append the delta's NEW text to the text already in its OLD span.
    fn append_delta(&mut self, side: ConflictSide, index: usize) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let diff = self.diff(side);
        let delta = diff.delta(index)?;
        let span = delta.span(ChangeSide::Old);
        let text = format!(
            "{}{}",
            delta.text(ChangeSide::Old, diff.text(ChangeSide::Old)),
            delta.text(ChangeSide::New, diff.text(ChangeSide::New))
        );
        let event = DeltaTextChangeEvent::new(ChangeSide::Old, span.start, span.len(), text);

        let mut own = self.diff(side).clone();
        let mut other = self.diff(side.other()).clone();
        own.process_text_event(&event)?;
        other.process_text_event(&event)?;
        own.set_resolved(index)?;
        *self.diff_mut(side) = own;
        *self.diff_mut(side.other()) = other;
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::SimilarLineDiffer;
    use crate::errors::ResolveError;

    fn merge(base: &str, yours: &str, theirs: &str) -> MergeData {
        MergeData::from_versions("file.txt", base, yours, theirs, &SimilarLineDiffer::default())
    }

    fn accept_all(data: &mut MergeData, chain: &ResolveOptionChain) {
        data.accept_side(ConflictSide::Yours, chain).unwrap();
        data.accept_side(ConflictSide::Theirs, chain).unwrap();
    }

    #[test]
    fn test_non_overlapping_changes_merge() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge("a\nb\nc\nd\ne\n", "a\nB\nc\nd\ne\n", "a\nb\nc\nd\nE\n");
        data.mark_conflicting(&chain);
        assert!(!data.has_conflicting());
        accept_all(&mut data, &chain);
        assert_eq!(data.merged_text(), "a\nB\nc\nd\nE\n");
        assert!(data.is_fully_resolved());
        assert_eq!(
            data.yours.text(ChangeSide::Old),
            data.theirs.text(ChangeSide::Old)
        );
    }

    #[test]
    fn test_same_change_applied_once() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge("a\nb\nc\n", "a\nB\nc\n", "a\nB\nc\n");
        let pairs = data.mark_conflicting(&chain).to_vec();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].conflict, ConflictType::Same);
        accept_all(&mut data, &chain);
        assert_eq!(data.merged_text(), "a\nB\nc\n");
    }

    #[test]
    fn test_conflicting_pair_is_reported() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n");
        data.mark_conflicting(&chain);
        assert!(data.has_conflicting());
        let summary = data.conflict_summary();
        assert_eq!(summary.conflicting, 2);
        assert_eq!(summary.none, 0);

        // accept_side leaves conflicting deltas alone
        accept_all(&mut data, &chain);
        assert_eq!(data.merged_text(), "a\nb\nc\n");
    }

    #[test]
    fn test_manual_accept_of_both_conflicting_sides() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n");
        data.mark_conflicting(&chain);
        data.accept_delta(ConflictSide::Yours, 0, &chain).unwrap();
        assert_eq!(data.merged_text(), "a\nX\nc\n");
        data.accept_delta(ConflictSide::Theirs, 0, &chain).unwrap();
        assert_eq!(data.merged_text(), "a\nX\nY\nc\n");
        assert!(data.is_fully_resolved());
    }

    #[test]
    fn test_resolution_keeps_other_deltas_consistent() {
        let chain = ResolveOptionChain::builtin();
        let base = "1\nlet a = b + c;\n3\n4\n5\n";
        let mut data = merge(
            base,
            "1\nlet x = b + c;\n3\n4\nfive\n",
            "zero\n1\nlet a = b + d;\n3\n4\n5\n",
        );
        data.mark_conflicting(&chain);
        assert!(!data.has_conflicting());
        accept_all(&mut data, &chain);
        assert_eq!(data.merged_text(), "zero\n1\nlet x = b + d;\n3\n4\nfive\n");
        data.yours.check_offsets().unwrap();
        data.theirs.check_offsets().unwrap();
    }

    #[test]
    fn test_failed_resolution_leaves_state_untouched() {
        let mut data = merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n");
        data.mark_conflicting(&ResolveOptionChain::builtin());
        let pair = data.conflict_pairs()[0];
        // the merged text is fine but the pair points past the delta list
        let bad = ConflictPair { theirs: 7, ..pair };
        assert!(data.apply_resolution(&bad, "merged\n").is_err());
        assert_eq!(data.merged_text(), "a\nb\nc\n");
        assert!(data.yours.deltas()[0].is_pending());
        assert!(data.theirs.deltas()[0].is_pending());
    }

    /// Claims every pair but cannot produce a merge.
    #[derive(Debug)]
    struct UnparsableOption;

    impl ResolveOption for UnparsableOption {
        fn name(&self) -> &'static str {
            "unparsable"
        }

        fn position(&self) -> u32 {
            10
        }

        fn can_resolve(&self, _ctx: &ConflictContext<'_>) -> bool {
            true
        }

        fn merged_text(&self, _ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
            Err(ResolveError::StructuralParse {
                format: "test",
                detail: "unexpected token".into(),
            })
        }
    }

    #[test]
    fn test_failing_option_leaves_both_deltas_pending() {
        let chain = ResolveOptionChain::new(vec![Box::new(UnparsableOption)]);
        let mut data = merge("a\nb\nc\n", "a\nX\nc\n", "a\nY\nc\n");
        let pairs = data.mark_conflicting(&chain).to_vec();
        assert_eq!(pairs[0].conflict, ConflictType::Resolvable("unparsable"));

        let err = data.accept_delta(ConflictSide::Yours, 0, &chain).unwrap_err();
        assert!(matches!(err, MergeError::Unresolvable { option: "unparsable", .. }));

        assert_eq!(data.merged_text(), "a\nb\nc\n");
        assert_eq!(data.theirs.text(ChangeSide::Old), "a\nb\nc\n");
        assert_eq!(data.yours.text(ChangeSide::New), "a\nX\nc\n");
        assert_eq!(data.theirs.text(ChangeSide::New), "a\nY\nc\n");
        assert!(data.yours.deltas()[0].is_pending());
        assert!(data.theirs.deltas()[0].is_pending());
        assert!(data.yours.drain_events().is_empty());
        assert!(data.theirs.drain_events().is_empty());
    }

    #[test]
    fn test_discard_and_reset() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge("a\nb\n", "A\nb\n", "a\nB\n");
        data.mark_conflicting(&chain);
        data.discard_delta(ConflictSide::Yours, 0).unwrap();
        accept_all(&mut data, &chain);
        assert_eq!(data.merged_text(), "a\nB\n");

        data.reset();
        assert_eq!(data.merged_text(), "a\nb\n");
        assert!(data.conflict_pairs().is_empty());
    }

    #[test]
    fn test_merged_patch_shows_changes() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge("a\nb\n", "a\nB\n", "a\nb\n");
        data.mark_conflicting(&chain);
        accept_all(&mut data, &chain);
        let patch = data.merged_patch();
        assert!(patch.contains("-b"));
        assert!(patch.contains("+B"));
    }

    #[test]
    fn test_file_path_with_renames() {
        let differ = SimilarLineDiffer::default();
        let renamed = FileDiff::new(FileDiffHeader::renamed("old.txt", "new.txt"), "x\n", "x\n", &differ);
        let modified = FileDiff::new(FileDiffHeader::modified("old.txt"), "x\n", "y\n", &differ);
        let data = MergeData::new(renamed.clone(), modified);
        assert_eq!(data.file_path(), "old.txt");

        let other_rename = FileDiff::new(FileDiffHeader::renamed("old.txt", "other.txt"), "x\n", "x\n", &differ);
        let both = MergeData::new(renamed, other_rename);
        assert_eq!(both.file_path(), "old.txt");
    }

    const POEM_BASE: &str = "Hello there, this is a test\nSo here are some words\nNo use taking a rest\nWe're not creating any turds";
    const POEM_YOURS: &str = "Hello there, this is a test\nSo here are several words\nNo use taking a rest\nWe're not creating any turds";
    const POEM_THEIRS: &str = "Hello there, this is a test\nSo here are words\nNo use taking a rest\nWe're not creating any turds";

    #[test]
    fn test_modify_text_before_delta_then_accept() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge(POEM_BASE, POEM_YOURS, POEM_THEIRS);
        let events = data.modify_text(0, 0, "Pre-text:\n").unwrap();
        assert!(events[0].user_edit);
        assert!(data.merged_text().starts_with("Pre-text:\n"));
        assert_eq!(data.yours.text(ChangeSide::Old), data.theirs.text(ChangeSide::Old));

        let events = data.accept_delta(ConflictSide::Yours, 0, &chain).unwrap();
        assert!(!events[0].user_edit);
        assert_eq!(data.merged_text(), format!("Pre-text:\n{}", POEM_YOURS));
        assert_eq!(data.yours.text(ChangeSide::Old), data.theirs.text(ChangeSide::Old));
        data.yours.check_offsets().unwrap();
        data.theirs.check_offsets().unwrap();
    }

    #[test]
    fn test_modify_text_inside_delta_is_absorbed() {
        let chain = ResolveOptionChain::builtin();
        let mut data = merge(POEM_BASE, POEM_YOURS, POEM_THEIRS);
        let offset = "Hello there, this is a test\nSo here are some ".len();
        data.modify_text(offset, 0, "more ").unwrap();
        assert_eq!(&data.merged_text()[offset..offset + 5], "more ");

        data.accept_delta(ConflictSide::Yours, 0, &chain).unwrap();
        assert_eq!(data.merged_text(), POEM_YOURS);
        assert_eq!(data.theirs.text(ChangeSide::Old), POEM_YOURS);
    }

    #[test]
    fn test_modify_text_out_of_range_changes_nothing() {
        let mut data = merge("a\nb\n", "a\nB\n", "a\nb\n");
        assert!(data.modify_text(3, 10, "x").is_err());
        assert_eq!(data.merged_text(), "a\nb\n");
        assert_eq!(data.theirs.text(ChangeSide::Old), "a\nb\n");
    }

    #[test]
    fn test_delete_against_modify_conflicts() {
        let chain = ResolveOptionChain::builtin();
        let differ = SimilarLineDiffer::default();
        let deleted = FileDiffHeader {
            new_path: None,
            kind: ChangeKind::Delete,
            ..FileDiffHeader::modified("f.txt")
        };
        let mut data = MergeData::new(
            FileDiff::new(deleted, "a\nb\n", "", &differ),
            FileDiff::new(FileDiffHeader::modified("f.txt"), "a\nb\n", "a\nb\nc\n", &differ),
        );
        assert_eq!(data.deleted_side(), Some(ConflictSide::Yours));

        let pairs = data.mark_conflicting(&chain).to_vec();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].conflict, ConflictType::Conflicting);
        assert!(data.has_conflicting());
        assert_eq!(data.conflict_summary().conflicting, 2);

        accept_all(&mut data, &chain);
        assert_eq!(data.merged_text(), "a\nb\n");
    }

    #[test]
    fn test_delete_on_both_sides_is_not_a_conflict() {
        let differ = SimilarLineDiffer::default();
        let deleted = FileDiffHeader {
            new_path: None,
            kind: ChangeKind::Delete,
            ..FileDiffHeader::modified("f.txt")
        };
        let data = MergeData::new(
            FileDiff::new(deleted.clone(), "a\n", "", &differ),
            FileDiff::new(deleted, "a\n", "", &differ),
        );
        assert_eq!(data.deleted_side(), None);
        assert!(!data.has_conflicting());
    }

    #[test]
    fn test_max_text_chars_counts_characters() {
        let data = merge("äöü\n", "äöü\n", "ab\n");
        assert_eq!(data.max_text_chars(), 4);
    }

    #[test]
    fn test_line_ending_policy() {
        let data = merge("a\r\nb\r\n", "a\r\nB\r\n", "A\r\nb\r\n");
        assert_eq!(data.line_ending(LineEnding::Unix), LineEnding::Windows);

        let mixed = merge("a\nb\n", "a\r\nB\r\n", "A\nb\n");
        assert_eq!(mixed.line_ending(LineEnding::Mac), LineEnding::Mac);
    }
}
