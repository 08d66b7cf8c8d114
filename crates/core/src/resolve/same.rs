//! Identical edits on both sides.

use super::{ConflictContext, ResolveOption};
use crate::conflict::ConflictSide;
use crate::diff::ChangeSide;
use crate::errors::ResolveError;

pub const NAME: &str = "same";

/// Both deltas replace the same OLD range with the same text.
///
/// NEW ranges are not compared: they are positions in two different files.
pub fn is_same_change(ctx: &ConflictContext<'_>) -> bool {
    ctx.delta(ConflictSide::Yours).span(ChangeSide::Old)
        == ctx.delta(ConflictSide::Theirs).span(ChangeSide::Old)
        && ctx.new_text(ConflictSide::Yours) == ctx.new_text(ConflictSide::Theirs)
}

/// Accepts either side of an identical edit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameResolveOption;

impl ResolveOption for SameResolveOption {
    fn name(&self) -> &'static str {
        NAME
    }

    fn position(&self) -> u32 {
        0
    }

    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool {
        is_same_change(ctx)
    }

    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
        if !is_same_change(ctx) {
            return Err(ResolveError::NotApplicable("edits are not identical".into()));
        }
        Ok(ctx.new_text(ConflictSide::Yours).to_string())
    }
}
