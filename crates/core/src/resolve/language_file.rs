//! Translation files made of `<stringEntry>` elements.
//!
//! ```xml
//! <stringEntry>
//!   <name>greeting</name>
//!   <value>Hello</value>
//! </stringEntry>
//! ```
//!
//! When both branches add entries at the same place the line diff usually
//! matches the `<stringEntry>` line of the following entry, so each hunk
//! starts inside an element and ends with an opening tag. Such hunks are
//! rotated back into whole elements before they are parsed.

use std::collections::BTreeMap;

use super::xml::{extract_tag_content, split_elements};
use super::{ConflictContext, ResolveOption};
use crate::conflict::ConflictSide;
use crate::diff::{ChangeKind, ChangeSide};
use crate::errors::ResolveError;

pub const NAME: &str = "language_file";

const FORMAT: &str = "language file";
const OPEN: &str = "<stringEntry>";

/// Key/value pairs of a `<stringEntry>` fragment.
pub fn parse_entries(fragment: &str) -> Result<BTreeMap<String, String>, ResolveError> {
    let compact: String = fragment.lines().map(str::trim).collect();
    let normalized = if compact.ends_with(OPEN) && !compact.starts_with(OPEN) {
        format!("{}{}", OPEN, &compact[..compact.len() - OPEN.len()])
    } else {
        compact
    };

    let mut entries = BTreeMap::new();
    for element in split_elements(&normalized, "stringEntry", FORMAT)? {
        let name = extract_tag_content(element, "name");
        let value = extract_tag_content(element, "value");
        match (name, value) {
            (Some(name), Some(value)) => {
                entries.insert(name, value);
            }
            _ => {
                return Err(ResolveError::StructuralParse {
                    format: FORMAT,
                    detail: format!("entry without name or value: '{}'", element),
                })
            }
        }
    }
    Ok(entries)
}

/// Merges translation entries added by both sides at the same point.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageFileResolveOption;

impl LanguageFileResolveOption {
    fn check(ctx: &ConflictContext<'_>) -> Result<(), ResolveError> {
        let yours = ctx.delta(ConflictSide::Yours);
        let theirs = ctx.delta(ConflictSide::Theirs);
        if yours.kind() != ChangeKind::Add
            || theirs.kind() != ChangeKind::Add
            || yours.span(ChangeSide::Old) != theirs.span(ChangeSide::Old)
        {
            return Err(ResolveError::NotApplicable(
                "entries must both be insertions at the same point".into(),
            ));
        }

        let mine = parse_entries(ctx.new_text(ConflictSide::Yours))?;
        let other = parse_entries(ctx.new_text(ConflictSide::Theirs))?;
        if mine.is_empty() || other.is_empty() {
            return Err(ResolveError::NotApplicable("no entries added".into()));
        }
        if let Some(key) = other.keys().find(|key| mine.contains_key(*key)) {
            return Err(ResolveError::NotApplicable(format!(
                "key '{}' added on both sides",
                key
            )));
        }
        Ok(())
    }
}

impl ResolveOption for LanguageFileResolveOption {
    fn name(&self) -> &'static str {
        NAME
    }

    fn position(&self) -> u32 {
        400
    }

    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool {
        Self::check(ctx).is_ok()
    }

    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
        Self::check(ctx)?;
        // Both hunks are cut at the same element boundary, so appending
        // keeps the surrounding document well formed.
        Ok(format!(
            "{}{}",
            ctx.new_text(ConflictSide::Yours),
            ctx.new_text(ConflictSide::Theirs)
        ))
    }
}
