//! Repository collaborator: staging resolved files and reading versions.

pub mod git;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::RepositoryError;

pub use git::{ConflictingFile, Git2Repository};

/// Summary of a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: String,
    pub summary: String,
    pub author: String,
    pub time: i64,
}

/// Operations the orchestrator needs from version control.
///
/// Paths are relative to [`top_level_directory`](Self::top_level_directory)
/// and use forward slashes.
pub trait Repository {
    /// Stage the working-tree state of `paths`, clearing any conflict entries.
    fn add(&self, paths: &[String]) -> Result<(), RepositoryError>;

    /// Remove `paths` from the working tree and the index.
    fn remove(&self, paths: &[String]) -> Result<(), RepositoryError>;

    /// Root of the working tree.
    fn top_level_directory(&self) -> &Path;

    fn commit(&self, id: &str) -> Result<CommitInfo, RepositoryError>;

    /// Content of `path` as of `commit`.
    fn file_version(&self, commit: &str, path: &str) -> Result<String, RepositoryError>;

    /// Current working-tree content of `path`.
    fn file_contents(&self, path: &str) -> Result<String, RepositoryError>;
}

pub(crate) fn read_text(path: &Path) -> Result<String, RepositoryError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RepositoryError::NotFound(path.display().to_string()),
        _ => RepositoryError::IoError(e),
    })?;
    String::from_utf8(bytes).map_err(|_| RepositoryError::InvalidUtf8(path.display().to_string()))
}

// ---------------------------------------------------------------------------
// Directory-backed double
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Recorded {
    staged: BTreeSet<String>,
    removed: BTreeSet<String>,
}

/// Working tree on disk with commits held in memory.
///
/// Staging only records paths, which makes it a stand-in for tests and for
/// merging loose files outside any repository.
#[derive(Debug)]
pub struct InMemoryRepository {
    root: PathBuf,
    commits: BTreeMap<String, (CommitInfo, BTreeMap<String, String>)>,
    recorded: Mutex<Recorded>,
}

impl InMemoryRepository {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            commits: BTreeMap::new(),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Register a commit holding `files` (path to content).
    pub fn with_commit<I, P, C>(mut self, id: &str, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let info = CommitInfo {
            id: id.to_string(),
            summary: String::new(),
            author: String::new(),
            time: 0,
        };
        let files = files
            .into_iter()
            .map(|(path, content)| (path.into(), content.into()))
            .collect();
        self.commits.insert(id.to_string(), (info, files));
        self
    }

    /// Paths staged so far, sorted.
    pub fn staged(&self) -> Vec<String> {
        self.with_recorded(|r| r.staged.iter().cloned().collect())
    }

    /// Paths removed so far, sorted.
    pub fn removed(&self) -> Vec<String> {
        self.with_recorded(|r| r.removed.iter().cloned().collect())
    }

    fn with_recorded<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut guard = self.recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    fn files(&self, commit: &str) -> Result<&(CommitInfo, BTreeMap<String, String>), RepositoryError> {
        self.commits
            .get(commit)
            .ok_or_else(|| RepositoryError::NotFound(format!("commit {}", commit)))
    }
}

impl Repository for InMemoryRepository {
    fn add(&self, paths: &[String]) -> Result<(), RepositoryError> {
        for path in paths {
            if !self.root.join(path).exists() {
                return Err(RepositoryError::NotFound(path.clone()));
            }
        }
        self.with_recorded(|r| {
            for path in paths {
                debug!(path = path.as_str(), "staged");
                r.removed.remove(path);
                r.staged.insert(path.clone());
            }
        });
        Ok(())
    }

    fn remove(&self, paths: &[String]) -> Result<(), RepositoryError> {
        for path in paths {
            let full = self.root.join(path);
            if full.exists() {
                std::fs::remove_file(&full)?;
            }
        }
        self.with_recorded(|r| {
            for path in paths {
                r.staged.remove(path);
                r.removed.insert(path.clone());
            }
        });
        Ok(())
    }

    fn top_level_directory(&self) -> &Path {
        &self.root
    }

    fn commit(&self, id: &str) -> Result<CommitInfo, RepositoryError> {
        Ok(self.files(id)?.0.clone())
    }

    fn file_version(&self, commit: &str, path: &str) -> Result<String, RepositoryError> {
        self.files(commit)?
            .1
            .get(path)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("{} at {}", path, commit)))
    }

    fn file_contents(&self, path: &str) -> Result<String, RepositoryError> {
        read_text(&self.root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_stage_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        let repo = InMemoryRepository::new(dir.path());

        repo.add(&["a.txt".to_string()]).unwrap();
        assert_eq!(repo.staged(), vec!["a.txt"]);
        assert_eq!(repo.file_contents("a.txt").unwrap(), "a\n");

        repo.remove(&["a.txt".to_string()]).unwrap();
        assert!(repo.staged().is_empty());
        assert_eq!(repo.removed(), vec!["a.txt"]);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_in_memory_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let repo = InMemoryRepository::new(dir.path());
        assert!(matches!(
            repo.add(&["missing.txt".to_string()]),
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.file_contents("missing.txt"),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_in_memory_commits() {
        let dir = tempfile::tempdir().unwrap();
        let repo = InMemoryRepository::new(dir.path()).with_commit("base", [("f.txt", "one\n")]);
        assert_eq!(repo.commit("base").unwrap().id, "base");
        assert_eq!(repo.file_version("base", "f.txt").unwrap(), "one\n");
        assert!(repo.file_version("base", "g.txt").is_err());
        assert!(repo.commit("other").is_err());
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin"), [0xff, 0xfe, 0x00]).unwrap();
        let repo = InMemoryRepository::new(dir.path());
        assert!(matches!(
            repo.file_contents("bin"),
            Err(RepositoryError::InvalidUtf8(_))
        ));
    }
}
