//! Resolve-option chain: prioritized strategies that reconcile a pair of
//! overlapping deltas.
//!
//! Each [`ResolveOption`] answers two questions about a pair, given as a
//! [`ConflictContext`]: can it merge the two edits, and what is the merged
//! text for the union of their OLD ranges. The default
//! [`ResolveOption::resolve`] writes that text into both diffs through
//! [`MergeData::apply_resolution`], so every option is all-or-nothing.
//!
//! | Option | Position |
//! |--------|----------|
//! | [`SameResolveOption`] | 0 |
//! | [`EnclosedResolveOption`] | 100 |
//! | [`ImportResolveOption`] | 200 |
//! | [`LiquibaseResolveOption`] | 250 |
//! | [`WordBasedResolveOption`] | 300 |
//! | [`LanguageFileResolveOption`] | 400 |

pub mod enclosed;
pub mod imports;
pub mod language_file;
pub mod liquibase;
pub mod same;
pub mod word_based;
mod xml;

use std::fmt;
use std::ops::Range;

use tracing::debug;

use crate::conflict::{ConflictPair, ConflictSide, MergeData};
use crate::diff::{ChangeDelta, ChangeSide, DeltaTextChangeEvent, FileDiff, FileDiffHeader};
use crate::errors::{ConfigError, MergeError, ResolveError};

pub use enclosed::EnclosedResolveOption;
pub use imports::ImportResolveOption;
pub use language_file::LanguageFileResolveOption;
pub use liquibase::LiquibaseResolveOption;
pub use same::{is_same_change, SameResolveOption};
pub use word_based::WordBasedResolveOption;

/// Names of the built-in options, in priority order.
pub const BUILTIN_OPTION_NAMES: [&str; 6] = [
    same::NAME,
    enclosed::NAME,
    imports::NAME,
    liquibase::NAME,
    word_based::NAME,
    language_file::NAME,
];

// ---------------------------------------------------------------------------
// Conflict context
// ---------------------------------------------------------------------------

/// Read-only view of one overlapping pair and the diffs it lives in.
#[derive(Debug, Clone, Copy)]
pub struct ConflictContext<'a> {
    yours: &'a FileDiff,
    theirs: &'a FileDiff,
    yours_index: usize,
    theirs_index: usize,
}

impl<'a> ConflictContext<'a> {
    pub fn new(
        yours: &'a FileDiff,
        theirs: &'a FileDiff,
        yours_index: usize,
        theirs_index: usize,
    ) -> Result<Self, MergeError> {
        yours.delta(yours_index)?;
        theirs.delta(theirs_index)?;
        Ok(Self {
            yours,
            theirs,
            yours_index,
            theirs_index,
        })
    }

    pub fn diff(&self, side: ConflictSide) -> &'a FileDiff {
        match side {
            ConflictSide::Yours => self.yours,
            ConflictSide::Theirs => self.theirs,
        }
    }

    pub fn delta(&self, side: ConflictSide) -> &'a ChangeDelta {
        let (diff, index) = match side {
            ConflictSide::Yours => (self.yours, self.yours_index),
            ConflictSide::Theirs => (self.theirs, self.theirs_index),
        };
        &diff.deltas()[index]
    }

    pub fn header(&self) -> &'a FileDiffHeader {
        self.yours.header()
    }

    /// Shared merge buffer (the OLD text of both diffs).
    pub fn base(&self) -> &'a str {
        self.yours.text(ChangeSide::Old)
    }

    /// NEW text of the delta on `side`.
    pub fn new_text(&self, side: ConflictSide) -> &'a str {
        let diff = self.diff(side);
        self.delta(side).text(ChangeSide::New, diff.text(ChangeSide::New))
    }

    /// Union of both deltas' OLD ranges.
    pub fn union_span(&self) -> Range<usize> {
        let y = self.delta(ConflictSide::Yours).span(ChangeSide::Old);
        let t = self.delta(ConflictSide::Theirs).span(ChangeSide::Old);
        y.start.min(t.start)..y.end.max(t.end)
    }

    /// The union span as `side` would have it: base text with only that
    /// side's delta applied.
    pub fn side_version(&self, side: ConflictSide) -> String {
        let union = self.union_span();
        let span = self.delta(side).span(ChangeSide::Old);
        let base = self.base();
        let mut version = String::with_capacity(union.len() + 32);
        version.push_str(&base[union.start..span.start]);
        version.push_str(self.new_text(side));
        version.push_str(&base[span.end..union.end]);
        version
    }
}

// ---------------------------------------------------------------------------
// ResolveOption trait
// ---------------------------------------------------------------------------

/// A strategy that can automatically reconcile a specific kind of collision.
pub trait ResolveOption: fmt::Debug + Send + Sync {
    /// Stable identifier, used in configuration and classifications.
    fn name(&self) -> &'static str;

    /// Priority; lower runs first.
    fn position(&self) -> u32;

    /// Whether this option can merge the pair.
    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool;

    /// Merged text replacing [`ConflictContext::union_span`].
    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError>;

    /// Merge the pair into both diffs and mark both deltas applied.
    ///
    /// Nothing is mutated when the merged text cannot be computed or the
    /// write-back fails.
    fn resolve(
        &self,
        merge: &mut MergeData,
        pair: &ConflictPair,
    ) -> Result<Vec<DeltaTextChangeEvent>, MergeError> {
        let merged = {
            let ctx = merge.context(pair)?;
            self.merged_text(&ctx)
                .map_err(|source| MergeError::Unresolvable {
                    option: self.name(),
                    source,
                })?
        };
        debug!(option = self.name(), yours = pair.yours, theirs = pair.theirs, "resolving pair");
        merge.apply_resolution(pair, &merged)
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Ordered collection of resolve options, sorted ascending by position.
#[derive(Debug)]
pub struct ResolveOptionChain {
    options: Vec<Box<dyn ResolveOption>>,
}

impl ResolveOptionChain {
    /// Build a chain; options with equal positions keep their given order.
    pub fn new(mut options: Vec<Box<dyn ResolveOption>>) -> Self {
        options.sort_by_key(|option| option.position());
        Self { options }
    }

    /// Chain with every built-in option and no extension filter on imports.
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(SameResolveOption),
            Box::new(EnclosedResolveOption),
            Box::new(ImportResolveOption::default()),
            Box::new(LiquibaseResolveOption),
            Box::new(WordBasedResolveOption),
            Box::new(LanguageFileResolveOption),
        ])
    }

    /// Build a chain from option names as they appear in configuration.
    pub fn from_names(names: &[String], import_extensions: &[String]) -> Result<Self, ConfigError> {
        let mut options: Vec<Box<dyn ResolveOption>> = Vec::with_capacity(names.len());
        for name in names {
            let option: Box<dyn ResolveOption> = match name.as_str() {
                same::NAME => Box::new(SameResolveOption),
                enclosed::NAME => Box::new(EnclosedResolveOption),
                imports::NAME => Box::new(ImportResolveOption::new(import_extensions.to_vec())),
                liquibase::NAME => Box::new(LiquibaseResolveOption),
                word_based::NAME => Box::new(WordBasedResolveOption),
                language_file::NAME => Box::new(LanguageFileResolveOption),
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "resolve_options.enabled".into(),
                        detail: format!(
                            "unknown option '{}' (expected one of {})",
                            other,
                            BUILTIN_OPTION_NAMES.join(", ")
                        ),
                    })
                }
            };
            options.push(option);
        }
        Ok(Self::new(options))
    }

    /// First option, by position, that can resolve the pair.
    pub fn find(&self, ctx: &ConflictContext<'_>) -> Option<&dyn ResolveOption> {
        let found = self
            .options
            .iter()
            .find(|option| option.can_resolve(ctx))
            .map(|option| option.as_ref());
        if let Some(option) = found {
            debug!(option = option.name(), "resolve option matched");
        }
        found
    }

    /// Option with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ResolveOption> {
        self.options
            .iter()
            .find(|option| option.name() == name)
            .map(|option| option.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.options.iter().map(|option| option.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl Default for ResolveOptionChain {
    fn default() -> Self {
        Self::builtin()
    }
}
