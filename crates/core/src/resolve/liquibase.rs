//! Liquibase changelog includes.
//!
//! Master changelogs are long lists of `<include file="..."/>` lines and
//! both branches usually append to the end. Two such insertions at the same
//! point merge cleanly as long as they include different files.

use std::collections::BTreeSet;

use super::xml::extract_attribute;
use super::{ConflictContext, ResolveOption};
use crate::conflict::ConflictSide;
use crate::diff::{ChangeKind, ChangeSide};
use crate::errors::ResolveError;

pub const NAME: &str = "liquibase";

const FORMAT: &str = "liquibase include";

/// Files referenced by a fragment made only of self-closing `<include>`
/// elements, one per line.
pub fn included_files(fragment: &str) -> Result<Vec<String>, ResolveError> {
    fragment
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if !line.starts_with("<include ") || !line.ends_with("/>") {
                return Err(ResolveError::StructuralParse {
                    format: FORMAT,
                    detail: format!("not a self-closing include element: '{}'", line),
                });
            }
            extract_attribute(line, "file").ok_or_else(|| ResolveError::StructuralParse {
                format: FORMAT,
                detail: format!("include without a file attribute: '{}'", line),
            })
        })
        .collect()
}

/// Merges two include lists added at the same point.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquibaseResolveOption;

impl LiquibaseResolveOption {
    fn check(ctx: &ConflictContext<'_>) -> Result<(), ResolveError> {
        let yours = ctx.delta(ConflictSide::Yours);
        let theirs = ctx.delta(ConflictSide::Theirs);
        if yours.kind() != ChangeKind::Add
            || theirs.kind() != ChangeKind::Add
            || yours.span(ChangeSide::Old) != theirs.span(ChangeSide::Old)
        {
            return Err(ResolveError::NotApplicable(
                "include lists must both be insertions at the same point".into(),
            ));
        }

        let mine: BTreeSet<String> = included_files(ctx.new_text(ConflictSide::Yours))?
            .into_iter()
            .collect();
        let other = included_files(ctx.new_text(ConflictSide::Theirs))?;
        if mine.is_empty() || other.is_empty() {
            return Err(ResolveError::NotApplicable("empty include list".into()));
        }
        if let Some(shared) = other.iter().find(|file| mine.contains(*file)) {
            return Err(ResolveError::NotApplicable(format!(
                "'{}' is included on both sides",
                shared
            )));
        }
        Ok(())
    }
}

impl ResolveOption for LiquibaseResolveOption {
    fn name(&self) -> &'static str {
        NAME
    }

    fn position(&self) -> u32 {
        250
    }

    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool {
        Self::check(ctx).is_ok()
    }

    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
        Self::check(ctx)?;
        Ok(format!(
            "{}{}",
            ctx.new_text(ConflictSide::Yours),
            ctx.new_text(ConflictSide::Theirs)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{FileDiff, FileDiffHeader, SimilarLineDiffer};

    const BASE: &str = "<databaseChangeLog>\n  <include file=\"001.xml\"/>\n</databaseChangeLog>\n";

    fn with_include(file: &str) -> String {
        BASE.replace(
            "</databaseChangeLog>",
            &format!("  <include file=\"{}\"/>\n</databaseChangeLog>", file),
        )
    }

    fn diff(new: &str) -> FileDiff {
        FileDiff::new(
            FileDiffHeader::modified("db.changelog-master.xml"),
            BASE,
            new,
            &SimilarLineDiffer::default(),
        )
    }

    #[test]
    fn test_included_files() {
        let files = included_files("  <include file=\"a.xml\"/>\n\n  <include relativeToChangelogFile=\"true\" file='b.xml' />\n").unwrap();
        assert_eq!(files, vec!["a.xml", "b.xml"]);
        assert!(included_files("<changeSet id=\"1\">").is_err());
    }

    #[test]
    fn test_disjoint_includes_merge() {
        let yours = diff(&with_include("002.xml"));
        let theirs = diff(&with_include("003.xml"));
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        assert!(LiquibaseResolveOption.can_resolve(&ctx));
        assert_eq!(
            LiquibaseResolveOption.merged_text(&ctx).unwrap(),
            "  <include file=\"002.xml\"/>\n  <include file=\"003.xml\"/>\n"
        );
    }

    #[test]
    fn test_same_file_on_both_sides_is_rejected() {
        let yours = diff(&with_include("002.xml"));
        let theirs = diff(&with_include("002.xml"));
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        assert!(!LiquibaseResolveOption.can_resolve(&ctx));
    }
}
