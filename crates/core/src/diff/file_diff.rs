//! [`FileDiff`]: one file's OLD and NEW text with the ordered delta sequence
//! between them, and the text mutation layer that edits either side.
//!
//! # Offset propagation
//!
//! Every mutation goes through [`FileDiff::process_text_event`], which
//! replaces a byte span on one side and then re-indexes every delta on that
//! side:
//!
//! | Delta position relative to the replaced span | Effect |
//! |----------------------------------------------|--------|
//! | Entirely before | unchanged |
//! | Entirely after | start and end shifted by the net length change |
//! | First delta overlapping the span | grows to cover the replacement |
//! | Any further overlapping delta | clipped to start after the replacement |
//!
//! Line numbers are then recomputed from offsets by counting newlines, and
//! the ordering invariants are checked before anything is committed. A
//! failed check leaves the diff untouched.

use tracing::{debug, warn};

use super::builder::{build_deltas, LineDiffer, LineEdit};
use super::delta::{ChangeDelta, DeltaRange};
use super::{
    ranges_overlap, ChangeKind, ChangeSide, ChangeStatus, DeltaTextChangeEvent, FileContentInfo,
    FileDiffHeader,
};
use crate::errors::MergeError;
use crate::text::{LineEnding, NewlineIndex};

/// One file's diff between an OLD and a NEW text.
#[derive(Debug, Clone)]
pub struct FileDiff {
    header: FileDiffHeader,
    old_info: FileContentInfo,
    new_info: FileContentInfo,
    original_old: String,
    original_new: String,
    old_text: String,
    new_text: String,
    edits: Vec<LineEdit>,
    deltas: Vec<ChangeDelta>,
    events: Vec<DeltaTextChangeEvent>,
}

impl FileDiff {
    /// Diff `old` against `new` with `differ` and build the delta sequence.
    pub fn new(
        header: FileDiffHeader,
        old: impl Into<String>,
        new: impl Into<String>,
        differ: &dyn LineDiffer,
    ) -> Self {
        let old = old.into();
        let new = new.into();
        let edits = differ.line_edits(&old, &new);
        Self::from_edits(header, old, new, edits)
    }

    /// Build a diff from precomputed line edits.
    pub fn from_edits(header: FileDiffHeader, old: String, new: String, edits: Vec<LineEdit>) -> Self {
        let fallback = LineEnding::platform();
        let old_info = FileContentInfo::of(&old, fallback);
        let new_info = FileContentInfo::of(&new, fallback);
        let deltas = initial_deltas(&header, &old, &new, &edits);
        debug!(
            path = header.path(),
            kind = %header.kind,
            deltas = deltas.len(),
            "file diff created"
        );
        Self {
            header,
            old_info,
            new_info,
            original_old: old.clone(),
            original_new: new.clone(),
            old_text: old,
            new_text: new,
            edits,
            deltas,
            events: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn header(&self) -> &FileDiffHeader {
        &self.header
    }

    pub fn content_info(&self, side: ChangeSide) -> &FileContentInfo {
        match side {
            ChangeSide::Old => &self.old_info,
            ChangeSide::New => &self.new_info,
        }
    }

    /// Current text of `side`.
    pub fn text(&self, side: ChangeSide) -> &str {
        match side {
            ChangeSide::Old => &self.old_text,
            ChangeSide::New => &self.new_text,
        }
    }

    /// Text of `side` as it was when the diff was created.
    pub fn original_text(&self, side: ChangeSide) -> &str {
        match side {
            ChangeSide::Old => &self.original_old,
            ChangeSide::New => &self.original_new,
        }
    }

    pub fn deltas(&self) -> &[ChangeDelta] {
        &self.deltas
    }

    pub fn delta(&self, index: usize) -> Result<&ChangeDelta, MergeError> {
        self.deltas.get(index).ok_or(MergeError::DeltaIndexOutOfBounds {
            index,
            len: self.deltas.len(),
        })
    }

    /// Text of the delta at `index` on `side`.
    pub fn delta_text(&self, index: usize, side: ChangeSide) -> Result<&str, MergeError> {
        Ok(self.delta(index)?.text(side, self.text(side)))
    }

    /// Sum of OLD and NEW line spans over all deltas.
    pub fn changed_line_count(&self) -> usize {
        self.deltas
            .iter()
            .map(|d| d.range(ChangeSide::Old).line_count() + d.range(ChangeSide::New).line_count())
            .sum()
    }

    /// Take the text change events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<DeltaTextChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn delta_mut(&mut self, index: usize) -> Result<&mut ChangeDelta, MergeError> {
        let len = self.deltas.len();
        self.deltas
            .get_mut(index)
            .ok_or(MergeError::DeltaIndexOutOfBounds { index, len })
    }

    // -----------------------------------------------------------------------
    // Status changes
    // -----------------------------------------------------------------------

    /// Write the delta's NEW text over its OLD span and mark it applied.
    pub fn accept_delta(&mut self, index: usize) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let delta = self.delta(index)?;
        if delta.kind() == ChangeKind::Rename {
            self.set_resolved(index)?;
            return Ok(Vec::new());
        }

        let span = delta.span(ChangeSide::Old);
        let replacement = delta.text(ChangeSide::New, &self.new_text).to_string();
        let event = DeltaTextChangeEvent::new(ChangeSide::Old, span.start, span.len(), replacement);
        self.process_text_event(&event)?;
        self.set_resolved(index)?;
        Ok(vec![event])
    }

    /// Drop the delta: the OLD text stays as it is.
    pub fn discard_delta(&mut self, index: usize) -> Result<(), MergeError> {
        self.delta_mut(index)?.set_status(ChangeStatus::Discarded);
        Ok(())
    }

    /// Mark the delta applied without touching any text, for when a resolve
    /// option already wrote the merged result.
    pub fn set_resolved(&mut self, index: usize) -> Result<(), MergeError> {
        self.delta_mut(index)?.set_status(ChangeStatus::Applied);
        Ok(())
    }

    /// Restore both texts and the delta sequence to their initial state.
    pub fn reset(&mut self) {
        let previous_len = self.old_text.len();
        self.old_text = self.original_old.clone();
        self.new_text = self.original_new.clone();
        self.deltas = initial_deltas(&self.header, &self.old_text, &self.new_text, &self.edits);
        self.events.push(DeltaTextChangeEvent::new(
            ChangeSide::Old,
            0,
            previous_len,
            self.old_text.clone(),
        ));
    }

    // -----------------------------------------------------------------------
    // Text mutation
    // -----------------------------------------------------------------------

    /// Replace `[offset, offset + length)` on `event.side` with `event.text`
    /// and re-index the deltas on that side.
    pub fn process_text_event(&mut self, event: &DeltaTextChangeEvent) -> Result<(), MergeError> {
        let side = event.side;
        let current = self.text(side);
        let edit_end = event
            .offset
            .checked_add(event.length)
            .filter(|&end| {
                end <= current.len()
                    && current.is_char_boundary(event.offset)
                    && current.is_char_boundary(end)
            })
            .ok_or(MergeError::InvalidRange {
                side,
                offset: event.offset,
                length: event.length,
                text_len: current.len(),
            })?;

        let mut text = String::with_capacity(current.len() + event.text.len());
        text.push_str(&current[..event.offset]);
        text.push_str(&event.text);
        text.push_str(&current[edit_end..]);

        let mut deltas = self.deltas.clone();
        propagate_offsets(&mut deltas, side, event, edit_end)?;
        reindex_lines(&mut deltas, side, &text);
        check_deltas(&deltas, side, text.len())?;

        match side {
            ChangeSide::Old => self.old_text = text,
            ChangeSide::New => self.new_text = text,
        }
        self.deltas = deltas;
        self.events.push(event.clone());
        Ok(())
    }

    /// Verify ordering and range invariants on both sides.
    pub fn check_offsets(&self) -> Result<(), MergeError> {
        check_deltas(&self.deltas, ChangeSide::Old, self.old_text.len())?;
        check_deltas(&self.deltas, ChangeSide::New, self.new_text.len())
    }
}

fn initial_deltas(header: &FileDiffHeader, old: &str, new: &str, edits: &[LineEdit]) -> Vec<ChangeDelta> {
    if edits.is_empty() && header.kind == ChangeKind::Rename {
        vec![ChangeDelta::new(
            ChangeKind::Rename,
            DeltaRange::default(),
            DeltaRange::default(),
        )]
    } else {
        build_deltas(old, new, edits)
    }
}

/// Shift, grow or clip every delta on `side` for a replacement of
/// `[event.offset, edit_end)` by `event.text`.
fn propagate_offsets(
    deltas: &mut [ChangeDelta],
    side: ChangeSide,
    event: &DeltaTextChangeEvent,
    edit_end: usize,
) -> Result<(), MergeError> {
    let edited = event.offset..edit_end;
    let inserted = event.text.len();
    let replacement_end = event.offset + inserted;
    let shift = |pos: usize| -> Result<usize, MergeError> {
        (pos + inserted)
            .checked_sub(event.length)
            .ok_or_else(|| MergeError::OffsetInconsistency {
                side,
                detail: format!("position {} cannot shift past edit at {}", pos, event.offset),
            })
    };

    let mut absorbed = false;
    for delta in deltas.iter_mut() {
        let range = delta.range_mut(side);
        let span = range.span();
        if ranges_overlap(&span, &edited) {
            let end = shift(span.end.max(edit_end))?;
            range.start = if absorbed {
                replacement_end
            } else {
                span.start.min(event.offset)
            };
            range.end = end;
            absorbed = true;
        } else if span.end > event.offset {
            range.start = shift(span.start)?;
            range.end = shift(span.end)?;
        }
    }
    Ok(())
}

fn reindex_lines(deltas: &mut [ChangeDelta], side: ChangeSide, text: &str) {
    let index = NewlineIndex::new(text);
    for delta in deltas.iter_mut() {
        let range = delta.range_mut(side);
        let (start_line, end_line) = index.line_range(range.start, range.end);
        range.start_line = start_line;
        range.end_line = end_line;
    }
}

fn check_deltas(deltas: &[ChangeDelta], side: ChangeSide, text_len: usize) -> Result<(), MergeError> {
    let mut previous_end = 0;
    for (index, delta) in deltas.iter().enumerate() {
        let range = delta.range(side);
        let detail = if range.start > range.end {
            Some(format!("delta {} has start {} > end {}", index, range.start, range.end))
        } else if range.end > text_len {
            Some(format!(
                "delta {} ends at {} beyond text length {}",
                index, range.end, text_len
            ))
        } else if range.start < previous_end {
            Some(format!(
                "delta {} starts at {} before previous delta ends at {}",
                index, range.start, previous_end
            ))
        } else {
            None
        };
        if let Some(detail) = detail {
            warn!(side = %side, %detail, "delta offsets inconsistent");
            return Err(MergeError::OffsetInconsistency { side, detail });
        }
        previous_end = range.end;
    }
    Ok(())
}
