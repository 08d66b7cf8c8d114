//! TOML-based configuration for the merge engine.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration with all built-in resolve options enabled.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diff::{DiffAlgorithm, SimilarLineDiffer};
use crate::errors::ConfigError;
use crate::orchestrator::AutoResolver;
use crate::policy::{ResolvePolicy, DEFAULT_MAX_CHANGED_LINES, DEFAULT_MAX_FILE_CHARS};
use crate::resolve::{ResolveOptionChain, BUILTIN_OPTION_NAMES};
use crate::text::LineEnding;

/// Commented configuration written by `mergeresolve init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# mergeresolve configuration

[logging]
# error, warn, info, debug or trace. RUST_LOG overrides this.
level = "warn"

[auto_resolve]
# always, never or ask
mode = "always"
# Files longer than this many characters are only auto-resolved when at
# most max_changed_lines lines changed (0 skips them all).
max_file_chars = 80000
max_changed_lines = 50
# Glob patterns of paths that are never auto-resolved.
exclude = []

[diff]
# myers, patience or lcs
algorithm = "myers"

[resolve_options]
# Enabled options; they always run in their built-in priority order.
enabled = ["same", "enclosed", "imports", "liquibase", "word_based", "language_file"]
# File extensions the import merger applies to; empty means any file.
import_extensions = []

[line_endings]
# Used when the two sides disagree: platform, unix or windows.
fallback = "platform"
"#;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level engine configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auto_resolve: AutoResolveConfig,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub resolve_options: ResolveOptionsConfig,

    #[serde(default)]
    pub line_endings: LineEndingConfig,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset (default "warn").
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-resolve
// ---------------------------------------------------------------------------

/// When the front end runs auto-resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoResolveMode {
    #[default]
    Always,
    Never,
    /// Ask first; a non-interactive session counts as `never`.
    Ask,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoResolveConfig {
    #[serde(default)]
    pub mode: AutoResolveMode,

    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,

    /// Changed-line allowance for files above `max_file_chars`.
    #[serde(default = "default_max_changed_lines")]
    pub max_changed_lines: usize,

    /// Glob patterns excluded from auto-resolution.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_max_file_chars() -> usize {
    DEFAULT_MAX_FILE_CHARS
}
fn default_max_changed_lines() -> usize {
    DEFAULT_MAX_CHANGED_LINES
}

impl Default for AutoResolveConfig {
    fn default() -> Self {
        Self {
            mode: AutoResolveMode::default(),
            max_file_chars: default_max_file_chars(),
            max_changed_lines: default_max_changed_lines(),
            exclude: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default)]
    pub algorithm: DiffAlgorithm,
}

// ---------------------------------------------------------------------------
// Resolve options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveOptionsConfig {
    /// Enabled option names (default: every built-in option).
    #[serde(default = "default_enabled_options")]
    pub enabled: Vec<String>,

    /// Extensions the import merger applies to; empty means any file.
    #[serde(default)]
    pub import_extensions: Vec<String>,
}

fn default_enabled_options() -> Vec<String> {
    BUILTIN_OPTION_NAMES.iter().map(|s| s.to_string()).collect()
}

impl Default for ResolveOptionsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_options(),
            import_extensions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Line endings
// ---------------------------------------------------------------------------

/// Line ending used when the two sides of a merge disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingFallback {
    #[default]
    Platform,
    Unix,
    Windows,
}

impl LineEndingFallback {
    pub fn line_ending(&self) -> LineEnding {
        match self {
            Self::Platform => LineEnding::platform(),
            Self::Unix => LineEnding::Unix,
            Self::Windows => LineEnding::Windows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineEndingConfig {
    #[serde(default)]
    pub fallback: LineEndingFallback,
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl EngineConfig {
    /// Load an [`EngineConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate option names, limits and exclude patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                detail: format!("'{}' is not one of {}", self.logging.level, LEVELS.join(", ")),
            });
        }
        if self.resolve_options.enabled.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "resolve_options.enabled".into(),
                detail: "at least one resolve option must be enabled".into(),
            });
        }
        if let Some(unknown) = self
            .resolve_options
            .enabled
            .iter()
            .find(|name| !BUILTIN_OPTION_NAMES.contains(&name.as_str()))
        {
            return Err(ConfigError::InvalidValue {
                field: "resolve_options.enabled".into(),
                detail: format!(
                    "unknown option '{}' (expected one of {})",
                    unknown,
                    BUILTIN_OPTION_NAMES.join(", ")
                ),
            });
        }
        if self.auto_resolve.max_file_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auto_resolve.max_file_chars".into(),
                detail: "must be > 0".into(),
            });
        }
        for pattern in &self.auto_resolve.exclude {
            validate_glob(pattern)?;
        }
        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn build_chain(&self) -> Result<ResolveOptionChain, ConfigError> {
        ResolveOptionChain::from_names(
            &self.resolve_options.enabled,
            &self.resolve_options.import_extensions,
        )
    }

    pub fn build_policy(&self) -> ResolvePolicy {
        ResolvePolicy::new(
            self.auto_resolve.max_file_chars,
            self.auto_resolve.max_changed_lines,
            self.auto_resolve.exclude.clone(),
        )
    }

    pub fn build_differ(&self) -> SimilarLineDiffer {
        SimilarLineDiffer::new(self.diff.algorithm)
    }

    /// Orchestrator configured from every section.
    pub fn build_resolver(&self) -> Result<AutoResolver, ConfigError> {
        Ok(AutoResolver::new(self.build_chain()?, self.build_policy())
            .with_line_ending_fallback(self.line_endings.fallback.line_ending()))
    }
}

/// Reject patterns `glob-match` would silently misread.
fn validate_glob(pattern: &str) -> Result<(), ConfigError> {
    let invalid = |detail: &str| ConfigError::InvalidValue {
        field: "auto_resolve.exclude".into(),
        detail: format!("'{}': {}", pattern, detail),
    };
    if pattern.trim().is_empty() {
        return Err(invalid("empty pattern"));
    }
    let mut braces = 0i32;
    let mut in_class = false;
    for c in pattern.chars() {
        match c {
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => braces += 1,
            '}' if !in_class => {
                braces -= 1;
                if braces < 0 {
                    return Err(invalid("unbalanced '}'"));
                }
            }
            _ => {}
        }
    }
    if in_class {
        return Err(invalid("unclosed '['"));
    }
    if braces != 0 {
        return Err(invalid("unclosed '{'"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[logging]
level = "debug"

[auto_resolve]
mode = "ask"
max_file_chars = 1000
max_changed_lines = 0
exclude = ["*.lock", "generated/**"]

[diff]
algorithm = "patience"

[resolve_options]
enabled = ["word_based", "same"]
import_extensions = ["ts", "java"]

[line_endings]
fallback = "windows"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: EngineConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.auto_resolve.mode, AutoResolveMode::Ask);
        assert_eq!(config.auto_resolve.max_changed_lines, 0);
        assert_eq!(config.diff.algorithm, DiffAlgorithm::Patience);
        assert_eq!(config.resolve_options.import_extensions, vec!["ts", "java"]);
        assert_eq!(config.line_endings.fallback.line_ending(), LineEnding::Windows);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = EngineConfig::load_and_resolve(&path).expect("load_and_resolve failed");
        assert_eq!(config.auto_resolve.exclude.len(), 2);
    }

    #[test]
    fn test_file_not_found() {
        let result = EngineConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auto_resolve]\nmode = \"sometimes\"\n").unwrap();
        assert!(matches!(
            EngineConfig::load_from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.auto_resolve.mode, AutoResolveMode::Always);
        assert_eq!(config.auto_resolve.max_file_chars, 80_000);
        assert_eq!(config.auto_resolve.max_changed_lines, 50);
        assert_eq!(config.diff.algorithm, DiffAlgorithm::Myers);
        assert_eq!(config.resolve_options.enabled.len(), BUILTIN_OPTION_NAMES.len());
        assert_eq!(config.line_endings.fallback, LineEndingFallback::Platform);
        config.validate().unwrap();
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let config: EngineConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_validate_rejects_unknown_option() {
        let mut config = EngineConfig::default();
        config.resolve_options.enabled.push("magic".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "resolve_options.enabled"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_option_list() {
        let mut config = EngineConfig::default();
        config.resolve_options.enabled.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_globs() {
        for pattern in ["", "src/[ab", "{a,b", "a}"] {
            let mut config = EngineConfig::default();
            config.auto_resolve.exclude = vec![pattern.to_string()];
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidValue { ref field, .. }) if field == "auto_resolve.exclude"
                ),
                "pattern {:?} should be rejected",
                pattern
            );
        }
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = EngineConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_resolver_uses_config() {
        let config: EngineConfig = toml::from_str(sample_toml()).unwrap();
        let resolver = config.build_resolver().unwrap();
        assert_eq!(resolver.chain().names(), vec!["same", "word_based"]);
        assert_eq!(resolver.policy().max_file_chars(), 1000);
        assert_eq!(resolver.policy().exclude().len(), 2);
    }
}
