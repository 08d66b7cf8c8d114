//! Change model: a single file's diff against a base as an ordered list of
//! [`ChangeDelta`]s, plus the text mutation layer that keeps their offsets
//! consistent while text is accepted, resolved or edited.
//!
//! Submodules:
//! - [`builder`]: turns raw line edits from a [`LineDiffer`] into deltas.
//! - [`delta`]: the [`ChangeDelta`] record and its range bookkeeping.
//! - [`file_diff`]: [`FileDiff`], owner of one delta sequence and its texts.
//! - [`words`]: word tokenization used by word-level merging.

pub mod builder;
pub mod delta;
pub mod file_diff;
pub mod words;

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::text::LineEnding;

pub use builder::{DiffAlgorithm, LineDiffer, LineEdit, SimilarLineDiffer};
pub use delta::{ChangeDelta, DeltaRange};
pub use file_diff::FileDiff;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// One side of a two-way diff. OLD is the common ancestor (and, during a
/// merge, the shared merge buffer); NEW is the modified version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSide {
    Old,
    New,
}

impl fmt::Display for ChangeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSide::Old => write!(f, "OLD"),
            ChangeSide::New => write!(f, "NEW"),
        }
    }
}

/// Kind of a delta, or of a whole file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Lines (or a file) added.
    Add,
    /// Lines (or a file) removed.
    Delete,
    /// Lines replaced by other lines.
    Modify,
    /// File moved without content change.
    Rename,
    /// File content and path identical.
    Same,
    /// Only file metadata (type or mode) changed.
    Changed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Add => "add",
            ChangeKind::Delete => "delete",
            ChangeKind::Modify => "modify",
            ChangeKind::Rename => "rename",
            ChangeKind::Same => "same",
            ChangeKind::Changed => "changed",
        };
        write!(f, "{}", s)
    }
}

/// Resolution status of a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Not yet accepted or discarded.
    #[default]
    Pending,
    /// The NEW text was written into the merge buffer.
    Applied,
    /// The change was dropped; the merge buffer keeps the OLD text.
    Discarded,
}

/// Type of the file on one side of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    #[default]
    File,
    Executable,
    Symlink,
    Submodule,
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Path and kind metadata of a [`FileDiff`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiffHeader {
    /// Path on the OLD side, `None` for an added file.
    pub old_path: Option<String>,
    /// Path on the NEW side, `None` for a deleted file.
    pub new_path: Option<String>,
    /// File-level change kind.
    pub kind: ChangeKind,
    pub old_type: FileType,
    pub new_type: FileType,
}

impl FileDiffHeader {
    /// Header for an in-place modification of `path`.
    pub fn modified(path: &str) -> Self {
        Self {
            old_path: Some(path.to_string()),
            new_path: Some(path.to_string()),
            kind: ChangeKind::Modify,
            old_type: FileType::File,
            new_type: FileType::File,
        }
    }

    /// Header for a rename from `old_path` to `new_path`.
    pub fn renamed(old_path: &str, new_path: &str) -> Self {
        Self {
            old_path: Some(old_path.to_string()),
            new_path: Some(new_path.to_string()),
            kind: ChangeKind::Rename,
            old_type: FileType::File,
            new_type: FileType::File,
        }
    }

    /// The most specific path: NEW if present, else OLD, else empty.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("")
    }

    /// File extension of [`path`](Self::path), lowercased.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(self.path())
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// Encoding and line-ending metadata of one side's original content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContentInfo {
    /// Encoding label of the source bytes. Text is held as UTF-8 internally.
    pub encoding: String,
    pub line_ending: LineEnding,
}

impl FileContentInfo {
    /// Describe `text`, using `fallback` when it has no line terminator.
    pub fn of(text: &str, fallback: LineEnding) -> Self {
        Self {
            encoding: "UTF-8".into(),
            line_ending: LineEnding::detect(text, fallback),
        }
    }
}

// ---------------------------------------------------------------------------
// Text change events
// ---------------------------------------------------------------------------

/// A plain record of one text replacement, emitted by every mutation so a
/// live text view can be updated incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaTextChangeEvent {
    pub side: ChangeSide,
    /// Byte offset of the replaced span.
    pub offset: usize,
    /// Length of the replaced span.
    pub length: usize,
    /// Replacement text.
    pub text: String,
    /// Typed by a user rather than produced by accepting or resolving.
    #[serde(default)]
    pub user_edit: bool,
}

impl DeltaTextChangeEvent {
    pub fn new(side: ChangeSide, offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            side,
            offset,
            length,
            text: text.into(),
            user_edit: false,
        }
    }

    /// An edit typed by a user.
    pub fn from_user(side: ChangeSide, offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            user_edit: true,
            ..Self::new(side, offset, length, text)
        }
    }

    /// Net change in text length caused by this event.
    pub fn net_delta(&self) -> isize {
        self.text.len() as isize - self.length as isize
    }
}

// ---------------------------------------------------------------------------
// Overlap policy
// ---------------------------------------------------------------------------

/// Whether two half-open ranges collide.
///
/// Non-empty ranges overlap when they intersect. An empty range is a pure
/// insert at a point `p`: it overlaps a non-empty range `[s, e)` when
/// `s <= p < e`, and another insert only at the same point. Ranges that
/// merely touch do not overlap.
pub fn ranges_overlap(a: &Range<usize>, b: &Range<usize>) -> bool {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => a.start == b.start,
        (true, false) => b.start <= a.start && a.start < b.end,
        (false, true) => a.start <= b.start && b.start < a.end,
        (false, false) => a.start < b.end && b.start < a.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_non_empty() {
        assert!(ranges_overlap(&(0..5), &(4..8)));
        assert!(!ranges_overlap(&(0..5), &(5..8)));
        assert!(!ranges_overlap(&(5..8), &(0..5)));
    }

    #[test]
    fn test_overlap_pure_insert() {
        // insert at the start of a change collides, at its end it does not
        assert!(ranges_overlap(&(3..3), &(3..7)));
        assert!(ranges_overlap(&(5..5), &(3..7)));
        assert!(!ranges_overlap(&(7..7), &(3..7)));
        assert!(!ranges_overlap(&(3..7), &(7..7)));
        assert!(ranges_overlap(&(4..4), &(4..4)));
        assert!(!ranges_overlap(&(4..4), &(5..5)));
    }

    #[test]
    fn test_header_extension() {
        let header = FileDiffHeader::modified("src/App.JS");
        assert_eq!(header.extension().as_deref(), Some("js"));
        assert_eq!(header.path(), "src/App.JS");
    }

    #[test]
    fn test_event_net_delta() {
        let event = DeltaTextChangeEvent::new(ChangeSide::Old, 10, 7, "");
        assert_eq!(event.net_delta(), -7);
        assert!(!event.user_edit);
    }

    #[test]
    fn test_user_edit_flag() {
        let event = DeltaTextChangeEvent::from_user(ChangeSide::Old, 0, 0, "typed");
        assert!(event.user_edit);
        assert_eq!(event.net_delta(), 5);

        let json = serde_json::json!({"side": "old", "offset": 1, "length": 2, "text": "x"});
        let parsed: DeltaTextChangeEvent = serde_json::from_value(json).unwrap();
        assert!(!parsed.user_edit);
    }
}
