//! `auto-resolve`, `status` and `accept` for the conflicts of a git repository.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dialoguer::Confirm;
use tracing::{info, warn};

use mergeresolve_core::config::{AutoResolveMode, EngineConfig};
use mergeresolve_core::progress::CancellationFlag;
use mergeresolve_core::{AutoResolveSummary, ConflictSide, FileOutcome, Git2Repository, MergeData, VersionAction};

use crate::progress::BarProgress;
use crate::style;

fn load_conflicts(config: &EngineConfig, repo_path: &Path) -> Result<(Git2Repository, Vec<MergeData>)> {
    let repo = Git2Repository::open(repo_path).context("failed to open git repository")?;
    let merges = repo
        .merge_data(&config.build_differ())
        .context("failed to read index conflicts")?;
    Ok((repo, merges))
}

/// Whether the configured mode lets auto-resolve run now.
fn mode_allows_run(mode: AutoResolveMode, count: usize) -> Result<bool> {
    match mode {
        AutoResolveMode::Always => Ok(true),
        AutoResolveMode::Never => Ok(false),
        AutoResolveMode::Ask if !console::user_attended() => {
            info!("auto-resolve mode is 'ask' but the session is not interactive");
            Ok(false)
        }
        AutoResolveMode::Ask => Confirm::new()
            .with_prompt(format!("Try to auto-resolve {} conflicting file(s)?", count))
            .default(true)
            .interact()
            .context("failed to read confirmation"),
    }
}

/// Resolve what can be resolved and stage it.
pub async fn run_auto_resolve(
    config: &EngineConfig,
    repo_path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<ExitCode> {
    let resolver = config
        .build_resolver()
        .context("invalid resolve option configuration")?;
    let (repo, mut merges) = load_conflicts(config, repo_path)?;

    if merges.is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&AutoResolveSummary::default())?);
        } else {
            println!("{}", style::success("No conflicting files"));
        }
        return Ok(ExitCode::SUCCESS);
    }

    if dry_run {
        let summary = resolver.preview(&merges);
        print_summary(&summary, json, true)?;
        return Ok(ExitCode::SUCCESS);
    }

    if !mode_allows_run(config.auto_resolve.mode, merges.len())? {
        println!("{}", style::warn("Auto-resolve is disabled; nothing was changed"));
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationFlag::new();
    let resolver = resolver.with_cancellation(cancel.clone());
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, stopping after the current file");
            cancel.cancel();
        }
    });

    let summary = tokio::task::spawn_blocking(move || {
        let progress = if json {
            BarProgress::hidden()
        } else {
            BarProgress::new()
        };
        resolver.perform_auto_resolve(&mut merges, &repo, &progress)
    })
    .await
    .context("auto-resolve worker panicked")?;
    listener.abort();

    print_summary(&summary, json, false)?;
    Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &AutoResolveSummary, json: bool, dry_run: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Outcome", "Details"]);
    for file in &summary.files {
        table.add_row(vec![
            Cell::new(file.path()),
            Cell::new(style::outcome(file)),
            Cell::new(outcome_details(file)),
        ]);
    }

    println!();
    println!("{}", table);
    println!();
    let verb = if dry_run { "Would resolve" } else { "Resolved" };
    let line = format!("{} {} of {} conflicting file(s)", verb, summary.resolved(), summary.total);
    if summary.resolved() == summary.total {
        println!("{}", style::success(&line));
    } else {
        println!("{}", style::warn(&line));
    }
    if summary.cancelled {
        println!("{}", style::error("Cancelled before all files were processed"));
    }
    Ok(())
}

fn outcome_details(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Resolved {
            line_ending,
            summary,
            ..
        } => format!(
            "{} same, {} resolvable, {}",
            summary.same, summary.resolvable, line_ending
        ),
        FileOutcome::StillConflicting { summary, .. } => {
            format!("{} conflicting delta(s)", summary.conflicting)
        }
        FileOutcome::Skipped { decision, .. } => decision.label().to_string(),
        FileOutcome::Failed { error, .. } => error.clone(),
    }
}

/// Per-file classification counts.
pub fn run_status(config: &EngineConfig, repo_path: &Path, json: bool) -> Result<ExitCode> {
    let resolver = config
        .build_resolver()
        .context("invalid resolve option configuration")?;
    let (_repo, mut merges) = load_conflicts(config, repo_path)?;
    for merge in &mut merges {
        merge.mark_conflicting(resolver.chain());
    }
    let preview = resolver.preview(&merges);

    if json {
        let rows: Vec<_> = merges
            .iter()
            .zip(&preview.files)
            .map(|(merge, outcome)| {
                serde_json::json!({
                    "path": merge.file_path(),
                    "summary": merge.conflict_summary(),
                    "pairs": merge.conflict_pairs(),
                    "auto_resolve": outcome,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(ExitCode::SUCCESS);
    }

    if merges.is_empty() {
        println!("{}", style::success("No conflicting files"));
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!("{}", style::header(&format!("Conflicting Files ({})", merges.len())));
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "None", "Same", "Resolvable", "Conflicting", "Auto-resolve"]);
    for (merge, outcome) in merges.iter().zip(&preview.files) {
        let summary = merge.conflict_summary();
        table.add_row(vec![
            Cell::new(merge.file_path()),
            Cell::new(summary.none),
            Cell::new(summary.same),
            Cell::new(summary.resolvable),
            Cell::new(summary.conflicting),
            Cell::new(style::outcome(outcome)),
        ]);
    }
    println!("{}", table);
    println!();
    println!(
        "{}",
        style::dim("Run 'mergeresolve auto-resolve' to resolve and stage what can be merged.")
    );
    Ok(ExitCode::SUCCESS)
}

/// Take `side`'s whole version of every file in `paths`.
///
/// Exits with 1 when a path is not in conflict or could not be settled.
pub fn run_accept(
    config: &EngineConfig,
    repo_path: &Path,
    side: ConflictSide,
    paths: &[String],
    json: bool,
) -> Result<ExitCode> {
    let resolver = config
        .build_resolver()
        .context("invalid resolve option configuration")?;
    let (repo, mut merges) = load_conflicts(config, repo_path)?;

    let mut actions: Vec<VersionAction> = Vec::new();
    let mut failed = false;
    for path in paths {
        let Some(merge) = merges.iter_mut().find(|merge| merge.file_path() == *path) else {
            warn!(path = path.as_str(), "not a conflicting file");
            eprintln!("{}", style::warn(&format!("{} is not in conflict", path)));
            failed = true;
            continue;
        };
        match resolver.accept_version(merge, side, &repo) {
            Ok(action) => actions.push(action),
            Err(e) => {
                eprintln!("{}", style::error(&format!("{}: {}", path, e)));
                failed = true;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
    } else {
        for action in &actions {
            let line = match action {
                VersionAction::Written { path } => format!("Took {} version of {}", side, path),
                VersionAction::Removed { path } => format!("Removed {} ({} deleted it)", path, side),
            };
            println!("{}", style::success(&line));
        }
    }
    Ok(if failed { ExitCode::from(1) } else { ExitCode::SUCCESS })
}
