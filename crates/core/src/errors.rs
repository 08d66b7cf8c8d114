//! Error types for the merge-resolution core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

use crate::diff::ChangeSide;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Merge / text-mutation errors
// ---------------------------------------------------------------------------

/// Errors from the change model, the text mutation layer and [`MergeData`].
///
/// [`MergeData`]: crate::conflict::MergeData
#[derive(Debug, Error)]
pub enum MergeError {
    /// Offset propagation produced a delta list that breaks the ordering or
    /// range invariants. The file must be left for manual resolution.
    #[error("offset inconsistency on {side} side: {detail}")]
    OffsetInconsistency { side: ChangeSide, detail: String },

    /// A text event addressed a span outside the current text.
    #[error("invalid span [{offset}, {offset}+{length}) on {side} side (text length {text_len})")]
    InvalidRange {
        side: ChangeSide,
        offset: usize,
        length: usize,
        text_len: usize,
    },

    /// No delta exists at the given index.
    #[error("delta index {index} out of bounds ({len} deltas)")]
    DeltaIndexOutOfBounds { index: usize, len: usize },

    /// A pair was classified by an option that is not in the active chain.
    #[error("resolve option '{0}' is not part of the active chain")]
    UnknownResolveOption(String),

    /// The option that classified a pair could not produce a merge result.
    #[error("resolve option '{option}' could not resolve the pair: {source}")]
    Unresolvable {
        option: &'static str,
        #[source]
        source: ResolveError,
    },
}

// ---------------------------------------------------------------------------
// Resolve-option errors
// ---------------------------------------------------------------------------

/// Errors raised inside a resolve option while computing a merge result.
///
/// These never escape classification: a failing option simply reports that
/// it cannot resolve the pair and the next option is tried.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Domain-specific content did not parse.
    #[error("failed to parse {format} content: {detail}")]
    StructuralParse { format: &'static str, detail: String },

    /// The option does not apply to this pair.
    #[error("{0}")]
    NotApplicable(String),
}

// ---------------------------------------------------------------------------
// Repository errors
// ---------------------------------------------------------------------------

/// Errors from the repository collaborator (staging, reading versions).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// A bare repository has no working directory to write into.
    #[error("repository at '{0}' has no working directory")]
    NoWorkDir(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// A commit, path or blob could not be found.
    #[error("not found: {0}")]
    NotFound(String),

    /// File content is not valid UTF-8 text.
    #[error("'{0}' is not valid UTF-8 text")]
    InvalidUtf8(String),

    /// Generic I/O wrapper.
    #[error("repository I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = MergeError::OffsetInconsistency {
            side: ChangeSide::Old,
            detail: "delta 2 starts before delta 1 ends".into(),
        };
        assert_eq!(
            err.to_string(),
            "offset inconsistency on OLD side: delta 2 starts before delta 1 ends"
        );

        let err = RepositoryError::RepositoryNotFound("/tmp/repo".into());
        assert_eq!(err.to_string(), "git repository not found at '/tmp/repo'");

        let err = ResolveError::StructuralParse {
            format: "import",
            detail: "unbalanced braces".into(),
        };
        assert!(err.to_string().contains("unbalanced braces"));

        let err = ConfigError::InvalidValue {
            field: "resolve_options.enabled".into(),
            detail: "unknown option 'foo'".into(),
        };
        assert!(err.to_string().contains("resolve_options.enabled"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let merge_err = MergeError::DeltaIndexOutOfBounds { index: 4, len: 2 };
        let core_err: CoreError = merge_err.into();
        assert!(matches!(core_err, CoreError::Merge(_)));

        let repo_err = RepositoryError::NotFound("HEAD".into());
        let core_err: CoreError = CoreError::Repository(repo_err);
        assert!(matches!(core_err, CoreError::Repository(_)));
    }

    #[test]
    fn test_unresolvable_keeps_source() {
        use std::error::Error as _;

        let err = MergeError::Unresolvable {
            option: "imports",
            source: ResolveError::StructuralParse {
                format: "import",
                detail: "bad line".into(),
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("resolve option 'imports'"));
    }
}
