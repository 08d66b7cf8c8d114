//! End-to-end test against a real git repository.
//!
//! Two branches edit the same line of a file, `git2` merges them and leaves
//! an index conflict, and the orchestrator resolves and stages it.

use std::path::Path;

use tempfile::TempDir;

use mergeresolve_core::config::EngineConfig;
use mergeresolve_core::conflict::ConflictSide;
use mergeresolve_core::orchestrator::{FileOutcome, VersionAction};
use mergeresolve_core::progress::NoopProgress;
use mergeresolve_core::repository::{Git2Repository, Repository};

const BASE: &str = "head\nlet total = price * count;\ntail\n";
const OURS: &str = "head\nlet sum = price * count;\ntail\n";
const THEIRS: &str = "head\nlet total = price * amount;\ntail\n";

fn signature() -> git2::Signature<'static> {
    git2::Signature::now("Test", "test@test.com").unwrap()
}

/// Write, stage and commit `content` on the checked-out branch.
fn commit_worktree(repo: &git2::Repository, path: &str, content: &str, message: &str) -> git2::Oid {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(path), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature(), &signature(), message, &tree, &parents)
        .unwrap()
}

/// Commit `content` onto `branch` starting from `parent`, without touching
/// the working tree.
fn commit_on_branch(
    repo: &git2::Repository,
    branch: &str,
    parent: git2::Oid,
    path: &str,
    content: &str,
) -> git2::Oid {
    let blob = repo.blob(content.as_bytes()).unwrap();
    let mut builder = repo.treebuilder(None).unwrap();
    builder.insert(path, blob, 0o100644).unwrap();
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let parent = repo.find_commit(parent).unwrap();
    repo.commit(
        Some(&format!("refs/heads/{}", branch)),
        &signature(),
        &signature(),
        "feature change",
        &tree,
        &[&parent],
    )
    .unwrap()
}

/// Repository whose index holds a conflict on `calc.rs`.
fn conflicted_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let base = commit_worktree(&repo, "calc.rs", BASE, "base");
    let feature = commit_on_branch(&repo, "feature", base, "calc.rs", THEIRS);
    commit_worktree(&repo, "calc.rs", OURS, "ours");

    let annotated = repo.find_annotated_commit(feature).unwrap();
    repo.merge(&[&annotated], None, None).unwrap();
    assert!(repo.index().unwrap().has_conflicts());
    dir
}

#[test]
fn test_index_conflict_is_resolved_and_staged() {
    let dir = conflicted_repo();
    let config = EngineConfig::default();
    let resolver = config.build_resolver().unwrap();

    let repo = Git2Repository::open(dir.path()).unwrap();
    let conflicts = repo.conflicting_files().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].base, BASE);
    assert_eq!(conflicts[0].ours, OURS);
    assert_eq!(conflicts[0].theirs, THEIRS);

    let mut merges = repo.merge_data(&config.build_differ()).unwrap();
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].file_path(), "calc.rs");

    let summary = resolver.perform_auto_resolve(&mut merges, &repo, &NoopProgress);

    assert!(merges.is_empty());
    assert!(matches!(summary.files[0], FileOutcome::Resolved { .. }));
    assert_eq!(
        repo.file_contents("calc.rs").unwrap(),
        "head\nlet sum = price * amount;\ntail\n"
    );
    let index = repo.repo().index().unwrap();
    assert!(!index.has_conflicts());
    assert!(repo.conflicting_files().unwrap().is_empty());
}

#[test]
fn test_dry_run_leaves_index_untouched() {
    let dir = conflicted_repo();
    let config = EngineConfig::default();
    let resolver = config.build_resolver().unwrap();

    let repo = Git2Repository::open(dir.path()).unwrap();
    let merges = repo.merge_data(&config.build_differ()).unwrap();
    let summary = resolver.preview(&merges);

    assert_eq!(summary.resolved(), 1);
    assert!(repo.repo().index().unwrap().has_conflicts());
}

#[test]
fn test_accept_theirs_version_clears_conflict() {
    let dir = conflicted_repo();
    let config = EngineConfig::default();
    let resolver = config.build_resolver().unwrap();

    let repo = Git2Repository::open(dir.path()).unwrap();
    let mut merges = repo.merge_data(&config.build_differ()).unwrap();
    let action = resolver
        .accept_version(&mut merges[0], ConflictSide::Theirs, &repo)
        .unwrap();

    assert_eq!(action, VersionAction::Written { path: "calc.rs".into() });
    assert_eq!(repo.file_contents("calc.rs").unwrap(), THEIRS);
    assert!(!repo.repo().index().unwrap().has_conflicts());
}
