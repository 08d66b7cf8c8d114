//! Line bookkeeping and line-ending handling shared by the change model and
//! the write-back path.
//!
//! Offsets are byte offsets into UTF-8 text. Lines are split on `\n` and keep
//! their terminator, so `"a\r\nb"` is the two lines `"a\r\n"` and `"b"`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Line splitting
// ---------------------------------------------------------------------------

/// Split `text` into lines, each keeping its trailing `\n`.
///
/// A final line without a terminator is returned as-is; an empty text has no
/// lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Number of `\n`-terminated or trailing lines in `text`.
pub fn line_count(text: &str) -> usize {
    split_lines(text).len()
}

/// Byte offsets of the start of every line, followed by `text.len()`.
///
/// `starts[k]` is the offset of line `k`; indexing with the line count yields
/// the end of the text, which is where a pure insert after the last line goes.
pub fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    if starts.last() != Some(&text.len()) {
        starts.push(text.len());
    }
    starts
}

/// Offset of the start of `line` in a table built by [`line_starts`].
/// Lines past the end map to the end of the text.
pub fn offset_of_line(starts: &[usize], line: usize) -> usize {
    let last = starts.len().saturating_sub(1);
    starts[line.min(last)]
}

/// Index of newline positions used to turn offsets back into line numbers.
#[derive(Debug, Clone)]
pub struct NewlineIndex {
    newlines: Vec<usize>,
}

impl NewlineIndex {
    pub fn new(text: &str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter_map(|(idx, b)| (b == b'\n').then_some(idx))
            .collect();
        Self { newlines }
    }

    /// Number of `\n` characters strictly before `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&pos| pos < offset)
    }

    /// Half-open line range covered by the byte span `[start, end)`.
    pub fn line_range(&self, start: usize, end: usize) -> (usize, usize) {
        let first = self.line_of(start);
        if end <= start {
            (first, first)
        } else {
            (first, self.line_of(end - 1) + 1)
        }
    }
}

// ---------------------------------------------------------------------------
// Line endings
// ---------------------------------------------------------------------------

/// Line-ending convention of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    Unix,
    /// `\r\n`
    Windows,
    /// `\r`
    Mac,
}

impl LineEnding {
    /// The convention of the host platform.
    pub fn platform() -> Self {
        if cfg!(windows) {
            LineEnding::Windows
        } else {
            LineEnding::Unix
        }
    }

    /// Detect the convention from the first terminator in `text`, or return
    /// `fallback` when the text has none.
    pub fn detect(text: &str, fallback: LineEnding) -> Self {
        let bytes = text.as_bytes();
        for (idx, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => return LineEnding::Unix,
                b'\r' if bytes.get(idx + 1) == Some(&b'\n') => return LineEnding::Windows,
                b'\r' => return LineEnding::Mac,
                _ => {}
            }
        }
        fallback
    }

    /// The terminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Unix => "\n",
            LineEnding::Windows => "\r\n",
            LineEnding::Mac => "\r",
        }
    }

    /// Rewrite every `\r\n`, bare `\r` and bare `\n` in `text` to this
    /// convention.
    pub fn normalize(&self, text: &str) -> String {
        let target = self.as_str();
        let mut out = String::with_capacity(text.len() + text.len() / 16);
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push_str(target);
                }
                '\n' => out.push_str(target),
                other => out.push(other),
            }
        }
        out
    }

    /// Pick the convention for a merged file: the one both sides share, or
    /// `fallback` when they disagree.
    pub fn for_merge(yours: LineEnding, theirs: LineEnding, fallback: LineEnding) -> Self {
        if yours == theirs {
            yours
        } else {
            fallback
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Unix => write!(f, "LF"),
            LineEnding::Windows => write!(f, "CRLF"),
            LineEnding::Mac => write!(f, "CR"),
        }
    }
}
