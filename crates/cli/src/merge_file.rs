//! `merge-file`: three-way merge of loose files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};

use mergeresolve_core::config::EngineConfig;
use mergeresolve_core::diff::ChangeSide;
use mergeresolve_core::orchestrator::Unresolved;
use mergeresolve_core::{ConflictSide, MergeData};

use crate::style;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Merge YOURS and THEIRS against BASE. Exits with 1 when a manual decision
/// is needed.
pub fn run_merge_file(
    config: &EngineConfig,
    base: &Path,
    yours: &Path,
    theirs: &Path,
    output: Option<&PathBuf>,
    show_diff: bool,
) -> Result<ExitCode> {
    let resolver = config
        .build_resolver()
        .context("invalid resolve option configuration")?;
    let base_text = read(base)?;
    let merge = MergeData::from_versions(
        &yours.to_string_lossy(),
        &base_text,
        &read(yours)?,
        &read(theirs)?,
        &config.build_differ(),
    );

    match resolver.try_resolve(&merge) {
        Ok(resolved) => {
            let rendered = if show_diff {
                diffy::create_patch(&base_text, &resolved.text).to_string()
            } else {
                resolved.text
            };
            match output {
                Some(path) => {
                    std::fs::write(path, &rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("{}", style::success(&format!("Merged into {}", path.display())));
                }
                None => print!("{}", rendered),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(Unresolved::Conflicting(summary)) => {
            eprintln!(
                "{}",
                style::error(&format!(
                    "{} conflicting change(s) need a manual decision",
                    summary.conflicting
                ))
            );
            print_conflicts(&merge, &resolver);
            Ok(ExitCode::from(1))
        }
        Err(Unresolved::Skipped(decision)) => {
            eprintln!(
                "{}",
                style::warn(&format!("Skipped by auto-resolve policy ({})", decision.label()))
            );
            Ok(ExitCode::from(1))
        }
        Err(Unresolved::Failed(e)) => Err(e).context("merge failed"),
    }
}

fn print_conflicts(merge: &MergeData, resolver: &mergeresolve_core::AutoResolver) {
    let mut classified = merge.clone();
    classified.mark_conflicting(resolver.chain());
    for pair in classified.conflict_pairs() {
        let (Ok(yours), Ok(theirs)) = (
            classified.diff(ConflictSide::Yours).delta(pair.yours),
            classified.diff(ConflictSide::Theirs).delta(pair.theirs),
        ) else {
            continue;
        };
        let (yours, theirs) = (yours.range(ChangeSide::Old), theirs.range(ChangeSide::Old));
        eprintln!(
            "  base lines {}-{} (yours) vs {}-{} (theirs): {}",
            yours.start_line + 1,
            yours.end_line,
            theirs.start_line + 1,
            theirs.end_line,
            style::conflict_type(&pair.conflict)
        );
    }
}
