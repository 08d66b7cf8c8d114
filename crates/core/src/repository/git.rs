//! Local Git repository operations via `git2`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{read_text, CommitInfo, Repository};
use crate::conflict::MergeData;
use crate::diff::{ChangeKind, FileDiff, FileDiffHeader, FileType, LineDiffer};
use crate::errors::RepositoryError;

/// One path with conflict entries in the index.
///
/// A missing stage (added on one side, deleted on the other) has no path
/// and empty content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictingFile {
    pub base_path: Option<String>,
    pub ours_path: Option<String>,
    pub theirs_path: Option<String>,
    pub base: String,
    pub ours: String,
    pub theirs: String,
}

impl ConflictingFile {
    /// Most specific path of the conflict, for display.
    pub fn path(&self) -> &str {
        self.ours_path
            .as_deref()
            .or(self.theirs_path.as_deref())
            .or(self.base_path.as_deref())
            .unwrap_or("")
    }

    fn header(&self, new_path: Option<&String>) -> FileDiffHeader {
        let old_path = self.base_path.clone().or_else(|| new_path.cloned());
        let kind = match (&self.base_path, new_path) {
            (None, _) => ChangeKind::Add,
            (_, None) => ChangeKind::Delete,
            (Some(old), Some(new)) if old != new => ChangeKind::Rename,
            _ => ChangeKind::Modify,
        };
        FileDiffHeader {
            old_path,
            new_path: new_path.cloned(),
            kind,
            old_type: FileType::File,
            new_type: FileType::File,
        }
    }

    /// Diff both sides against the base.
    pub fn to_merge_data(&self, differ: &dyn LineDiffer) -> MergeData {
        MergeData::new(
            FileDiff::new(self.header(self.ours_path.as_ref()), &self.base, &self.ours, differ),
            FileDiff::new(self.header(self.theirs_path.as_ref()), &self.base, &self.theirs, differ),
        )
    }
}

/// [`Repository`] backed by a non-bare `git2` repository.
pub struct Git2Repository {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = git2::Repository::discover(path)
            .map_err(|_| RepositoryError::RepositoryNotFound(path.display().to_string()))?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| RepositoryError::NoWorkDir(path.display().to_string()))?;
        Ok(Self { repo, workdir })
    }

    pub fn repo(&self) -> &git2::Repository {
        &self.repo
    }

    /// Index entries left in conflict by a merge.
    #[instrument(skip(self))]
    pub fn conflicting_files(&self) -> Result<Vec<ConflictingFile>, RepositoryError> {
        let index = self.repo.index()?;
        let mut files = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let (base_path, base) = self.stage(conflict.ancestor.as_ref())?;
            let (ours_path, ours) = self.stage(conflict.our.as_ref())?;
            let (theirs_path, theirs) = self.stage(conflict.their.as_ref())?;
            files.push(ConflictingFile {
                base_path,
                ours_path,
                theirs_path,
                base,
                ours,
                theirs,
            });
        }
        debug!(count = files.len(), "collected index conflicts");
        Ok(files)
    }

    /// [`MergeData`] for every conflicting file whose stages are text.
    ///
    /// Binary stages are logged and left out.
    pub fn merge_data(&self, differ: &dyn LineDiffer) -> Result<Vec<MergeData>, RepositoryError> {
        let index = self.repo.index()?;
        let mut merges = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let stages = [
                self.stage(conflict.ancestor.as_ref()),
                self.stage(conflict.our.as_ref()),
                self.stage(conflict.their.as_ref()),
            ];
            match stages {
                [Ok((base_path, base)), Ok((ours_path, ours)), Ok((theirs_path, theirs))] => {
                    let file = ConflictingFile {
                        base_path,
                        ours_path,
                        theirs_path,
                        base,
                        ours,
                        theirs,
                    };
                    merges.push(file.to_merge_data(differ));
                }
                [base, ours, theirs] => {
                    for err in [base, ours, theirs].into_iter().filter_map(Result::err) {
                        match err {
                            RepositoryError::InvalidUtf8(path) => {
                                warn!(path = path.as_str(), "skipping non-text conflict");
                            }
                            other => return Err(other),
                        }
                    }
                }
            }
        }
        Ok(merges)
    }

    fn stage(&self, entry: Option<&git2::IndexEntry>) -> Result<(Option<String>, String), RepositoryError> {
        let Some(entry) = entry else {
            return Ok((None, String::new()));
        };
        let path = String::from_utf8_lossy(&entry.path).into_owned();
        let blob = self.repo.find_blob(entry.id)?;
        let content = String::from_utf8(blob.content().to_vec())
            .map_err(|_| RepositoryError::InvalidUtf8(path.clone()))?;
        Ok((Some(path), content))
    }

    fn find_commit(&self, id: &str) -> Result<git2::Commit<'_>, RepositoryError> {
        self.repo
            .revparse_single(id)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound => RepositoryError::NotFound(format!("commit {}", id)),
                _ => RepositoryError::Git2Error(e),
            })
    }
}

impl Repository for Git2Repository {
    #[instrument(skip(self))]
    fn add(&self, paths: &[String]) -> Result<(), RepositoryError> {
        let mut index = self.repo.index()?;
        for path in paths {
            if self.workdir.join(path).exists() {
                // Adding by path also drops the conflict stages of the entry.
                index.add_path(Path::new(path))?;
            } else {
                index.remove_path(Path::new(path))?;
            }
        }
        index.write()?;
        info!(count = paths.len(), "staged files");
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, paths: &[String]) -> Result<(), RepositoryError> {
        let mut index = self.repo.index()?;
        for path in paths {
            let full = self.workdir.join(path);
            if full.exists() {
                std::fs::remove_file(&full)?;
            }
            index.remove_path(Path::new(path))?;
        }
        index.write()?;
        info!(count = paths.len(), "removed files");
        Ok(())
    }

    fn top_level_directory(&self) -> &Path {
        &self.workdir
    }

    fn commit(&self, id: &str) -> Result<CommitInfo, RepositoryError> {
        let commit = self.find_commit(id)?;
        let author = commit.author();
        let info = CommitInfo {
            id: commit.id().to_string(),
            summary: commit.summary().unwrap_or("").to_string(),
            author: author.name().unwrap_or("").to_string(),
            time: commit.time().seconds(),
        };
        Ok(info)
    }

    fn file_version(&self, commit: &str, path: &str) -> Result<String, RepositoryError> {
        let tree = self.find_commit(commit)?.tree()?;
        let entry = tree
            .get_path(Path::new(path))
            .map_err(|_| RepositoryError::NotFound(format!("{} at {}", path, commit)))?;
        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        String::from_utf8(blob.content().to_vec()).map_err(|_| RepositoryError::InvalidUtf8(path.to_string()))
    }

    fn file_contents(&self, path: &str) -> Result<String, RepositoryError> {
        read_text(&self.workdir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_file(repo: &git2::Repository, path: &str, content: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        std::fs::write(workdir.join(path), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("Test", "test@test.com").unwrap();
        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap()
    }

    #[test]
    fn test_open_and_read_versions() {
        let dir = tempfile::tempdir().unwrap();
        let raw = git2::Repository::init(dir.path()).unwrap();
        let oid = commit_file(&raw, "hello.txt", "hello\n", "initial commit");
        std::fs::write(dir.path().join("hello.txt"), "changed\n").unwrap();

        let repo = Git2Repository::open(dir.path()).unwrap();
        let info = repo.commit(&oid.to_string()).unwrap();
        assert_eq!(info.summary, "initial commit");
        assert_eq!(info.author, "Test");
        assert_eq!(info.id, oid.to_string());
        assert_eq!(repo.file_version("HEAD", "hello.txt").unwrap(), "hello\n");
        assert_eq!(repo.file_contents("hello.txt").unwrap(), "changed\n");
        assert!(matches!(
            repo.file_version("HEAD", "missing.txt"),
            Err(RepositoryError::NotFound(_))
        ));
        assert!(repo.conflicting_files().unwrap().is_empty());
    }

    #[test]
    fn test_repo_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Git2Repository::open(dir.path().join("nope")),
            Err(RepositoryError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn test_add_and_remove_update_index() {
        let dir = tempfile::tempdir().unwrap();
        let raw = git2::Repository::init(dir.path()).unwrap();
        commit_file(&raw, "a.txt", "a\n", "init");
        std::fs::write(dir.path().join("b.txt"), "b\n").unwrap();

        let repo = Git2Repository::open(dir.path()).unwrap();
        repo.add(&["b.txt".to_string()]).unwrap();
        let index = repo.repo().index().unwrap();
        assert!(index.get_path(Path::new("b.txt"), 0).is_some());

        repo.remove(&["a.txt".to_string()]).unwrap();
        let index = repo.repo().index().unwrap();
        assert!(index.get_path(Path::new("a.txt"), 0).is_none());
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_conflicting_file_headers() {
        let file = ConflictingFile {
            base_path: Some("old.rs".into()),
            ours_path: Some("old.rs".into()),
            theirs_path: Some("new.rs".into()),
            base: "x\n".into(),
            ours: "y\n".into(),
            theirs: "x\n".into(),
        };
        let merge = file.to_merge_data(&crate::diff::SimilarLineDiffer::default());
        assert_eq!(merge.file_path(), "old.rs");
        assert_eq!(file.path(), "old.rs");

        let added = ConflictingFile {
            base_path: None,
            ours_path: Some("n.rs".into()),
            theirs_path: Some("n.rs".into()),
            base: String::new(),
            ours: "a\n".into(),
            theirs: "b\n".into(),
        };
        assert_eq!(added.header(added.ours_path.as_ref()).kind, ChangeKind::Add);
    }
}
