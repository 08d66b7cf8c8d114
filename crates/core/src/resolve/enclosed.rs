//! One edit already contains the other.

use super::{ConflictContext, ResolveOption};
use crate::conflict::ConflictSide;
use crate::diff::{ChangeKind, ChangeSide};
use crate::errors::ResolveError;

pub const NAME: &str = "enclosed";

/// Matches when one delta's OLD range contains the other's and its NEW text
/// contains the other's NEW text, so taking the outer edit keeps both.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnclosedResolveOption;

impl EnclosedResolveOption {
    /// The side whose edit encloses the other, if any.
    pub fn enclosing_side(ctx: &ConflictContext<'_>) -> Option<ConflictSide> {
        let yours = ctx.delta(ConflictSide::Yours);
        let theirs = ctx.delta(ConflictSide::Theirs);
        if yours.kind() == ChangeKind::Delete || theirs.kind() == ChangeKind::Delete {
            return None;
        }

        [ConflictSide::Yours, ConflictSide::Theirs]
            .into_iter()
            .find(|&outer| {
                let inner = outer.other();
                let outer_span = ctx.delta(outer).span(ChangeSide::Old);
                let inner_span = ctx.delta(inner).span(ChangeSide::Old);
                outer_span.start <= inner_span.start
                    && inner_span.end <= outer_span.end
                    && ctx.new_text(outer).contains(ctx.new_text(inner))
            })
    }
}

impl ResolveOption for EnclosedResolveOption {
    fn name(&self) -> &'static str {
        NAME
    }

    fn position(&self) -> u32 {
        100
    }

    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool {
        Self::enclosing_side(ctx).is_some()
    }

    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
        let outer = Self::enclosing_side(ctx)
            .ok_or_else(|| ResolveError::NotApplicable("neither edit encloses the other".into()))?;
        Ok(ctx.side_version(outer))
    }
}
