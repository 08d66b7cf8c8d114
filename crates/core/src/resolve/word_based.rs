//! Word-level merging of edits to the same lines.

use super::{ConflictContext, ResolveOption};
use crate::conflict::ConflictSide;
use crate::diff::words::merge_words;
use crate::errors::ResolveError;

pub const NAME: &str = "word_based";

/// Re-diffs both sides' versions of the overlapping lines word by word and
/// interleaves the word edits when none of them collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBasedResolveOption;

impl WordBasedResolveOption {
    fn merge(ctx: &ConflictContext<'_>) -> Option<String> {
        let span = ctx.union_span();
        let base = &ctx.base()[span];
        merge_words(
            base,
            &ctx.side_version(ConflictSide::Yours),
            &ctx.side_version(ConflictSide::Theirs),
        )
    }
}

impl ResolveOption for WordBasedResolveOption {
    fn name(&self) -> &'static str {
        NAME
    }

    fn position(&self) -> u32 {
        300
    }

    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool {
        Self::merge(ctx).is_some()
    }

    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
        Self::merge(ctx)
            .ok_or_else(|| ResolveError::NotApplicable("word-level edits overlap".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{FileDiff, FileDiffHeader, SimilarLineDiffer};

    const BASE: &str = "head\nlet total = price * count;\ntail\n";

    fn diff(new: &str) -> FileDiff {
        FileDiff::new(
            FileDiffHeader::modified("calc.rs"),
            BASE,
            new,
            &SimilarLineDiffer::default(),
        )
    }

    #[test]
    fn test_different_words_on_same_line() {
        let yours = diff("head\nlet sum = price * count;\ntail\n");
        let theirs = diff("head\nlet total = price * amount;\ntail\n");
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        assert!(WordBasedResolveOption.can_resolve(&ctx));
        assert_eq!(
            WordBasedResolveOption.merged_text(&ctx).unwrap(),
            "let sum = price * amount;\n"
        );
    }

    #[test]
    fn test_same_word_changed_differently() {
        let yours = diff("head\nlet total = cost * count;\ntail\n");
        let theirs = diff("head\nlet total = value * count;\ntail\n");
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        assert!(!WordBasedResolveOption.can_resolve(&ctx));
        assert!(WordBasedResolveOption.merged_text(&ctx).is_err());
    }
}
