//! Import-statement merging.
//!
//! Two sides adding different imports at the same place is the most common
//! collision in source files. When every line on both sides is an import
//! statement, the statements are parsed, unioned and written back: YOURS
//! first, then whatever THEIRS adds. JavaScript/TypeScript named imports
//! from the same module are combined into one statement; every other form
//! is deduplicated by its text.

use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::debug;

use super::{ConflictContext, ResolveOption};
use crate::conflict::ConflictSide;
use crate::errors::ResolveError;
use crate::text::LineEnding;

pub const NAME: &str = "imports";

const FORMAT: &str = "import";

/// Line patterns recognised as import statements.
const IMPORT_LINE_PATTERNS: [&str; 5] = [
    // import x from 'y';  import { a } from "y"
    r#"^\s*import\s+.+\s+from\s+['"][^'"]+['"]\s*;?\s*$"#,
    // import 'side-effect';
    r#"^\s*import\s+['"][^'"]+['"]\s*;?\s*$"#,
    // Java / Kotlin / Python: import a.b.C;  import static a.B.*;  import os
    r"^\s*import\s+(static\s+)?[A-Za-z_][A-Za-z0-9_.]*(\.\*)?\s*;?\s*$",
    // Python: from a.b import c, d as e
    r"^\s*from\s+\.*[A-Za-z0-9_.]*\s+import\s+[A-Za-z0-9_.*]+(\s+as\s+\w+)?(\s*,\s*[A-Za-z0-9_]+(\s+as\s+\w+)?)*\s*$",
    // Rust: use a::b;  pub(crate) use c::{d, e};
    r"^\s*(pub(\([^)]*\))?\s+)?use\s+[^;]+;\s*$",
];

const JS_FROM_PATTERN: &str = r#"^(\s*)import\s+(.+?)\s+from\s+(['"])([^'"]+)['"]\s*(;?)\s*$"#;

struct ImportSyntax {
    lines: Vec<Regex>,
    js_from: Regex,
}

impl ImportSyntax {
    fn compile() -> Result<Self, regex_lite::Error> {
        let lines = IMPORT_LINE_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            lines,
            js_from: Regex::new(JS_FROM_PATTERN)?,
        })
    }
}

fn syntax() -> Option<&'static ImportSyntax> {
    static SYNTAX: OnceLock<Option<ImportSyntax>> = OnceLock::new();
    SYNTAX
        .get_or_init(|| ImportSyntax::compile().ok())
        .as_ref()
}

/// Whether `line` is a single-line import statement.
pub fn is_import_line(line: &str) -> bool {
    syntax().is_some_and(|syntax| syntax.lines.iter().any(|re| re.is_match(line)))
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// One parsed import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatement {
    /// `import Default, { a, b } from 'module';`
    Named {
        indent: String,
        module: String,
        default: Option<String>,
        names: Vec<String>,
        quote: char,
        semicolon: bool,
    },
    /// Any other form, compared by its trimmed text.
    Plain(String),
}

impl ImportStatement {
    /// Parse one import line.
    pub fn parse(line: &str) -> Result<Self, ResolveError> {
        let syntax = syntax().ok_or_else(|| parse_error("import patterns unavailable"))?;
        if !is_import_line(line) {
            return Err(parse_error(format!("not an import statement: '{}'", line.trim())));
        }

        let Some(caps) = syntax.js_from.captures(line) else {
            return Ok(Self::Plain(line.trim_end().to_string()));
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        let clause = group(2).trim();
        if clause.starts_with('*') || clause.starts_with("type ") {
            return Ok(Self::Plain(line.trim_end().to_string()));
        }

        let (default, names) = match clause.find('{') {
            Some(open) => {
                let close = clause
                    .find('}')
                    .filter(|&close| close > open)
                    .ok_or_else(|| parse_error(format!("unbalanced braces in '{}'", line.trim())))?;
                if !clause[close + 1..].trim().is_empty() {
                    return Err(parse_error(format!("unexpected text after '}}' in '{}'", line.trim())));
                }
                let default = clause[..open].trim().trim_end_matches(',').trim();
                let names = clause[open + 1..close]
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                (non_empty(default), names)
            }
            None if clause.contains('}') => {
                return Err(parse_error(format!("unbalanced braces in '{}'", line.trim())))
            }
            None => (non_empty(clause), Vec::new()),
        };

        Ok(Self::Named {
            indent: group(1).to_string(),
            module: group(4).to_string(),
            default,
            names,
            quote: group(3).chars().next().unwrap_or('\''),
            semicolon: group(5) == ";",
        })
    }

    fn render(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Named {
                indent,
                module,
                default,
                names,
                quote,
                semicolon,
            } => {
                let clause = match (default, names.is_empty()) {
                    (Some(default), true) => default.clone(),
                    (Some(default), false) => format!("{}, {{ {} }}", default, names.join(", ")),
                    (None, _) => format!("{{ {} }}", names.join(", ")),
                };
                format!(
                    "{}import {} from {}{}{}{}",
                    indent,
                    clause,
                    quote,
                    module,
                    quote,
                    if *semicolon { ";" } else { "" }
                )
            }
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_error(detail: impl Into<String>) -> ResolveError {
    ResolveError::StructuralParse {
        format: FORMAT,
        detail: detail.into(),
    }
}

/// Ordered union of import statements. Blank separator lines are kept where
/// they were added.
#[derive(Debug, Default)]
pub struct ImportSet {
    entries: Vec<Option<ImportStatement>>,
}

impl ImportSet {
    fn statements_mut(&mut self) -> impl Iterator<Item = &mut ImportStatement> {
        self.entries.iter_mut().flatten()
    }

    /// Keep a blank line at the current end of the set.
    pub fn add_separator(&mut self) {
        self.entries.push(None);
    }

    pub fn add(&mut self, statement: ImportStatement) {
        match statement {
            ImportStatement::Plain(text) => {
                let exists = self.statements_mut().any(|existing| {
                    matches!(existing, ImportStatement::Plain(other) if other.trim() == text.trim())
                });
                if !exists {
                    self.entries.push(Some(ImportStatement::Plain(text)));
                }
            }
            ImportStatement::Named {
                indent,
                module,
                default,
                names,
                quote,
                semicolon,
            } => {
                let target = self.statements_mut().find_map(|existing| match existing {
                    ImportStatement::Named {
                        module: m,
                        default: d,
                        names: n,
                        ..
                    } if *m == module && (d.is_none() || default.is_none() || *d == default) => {
                        Some((d, n))
                    }
                    _ => None,
                });
                match target {
                    Some((existing_default, existing_names)) => {
                        if existing_default.is_none() {
                            *existing_default = default;
                        }
                        for name in names {
                            if !existing_names.contains(&name) {
                                existing_names.push(name);
                            }
                        }
                    }
                    None => self.entries.push(Some(ImportStatement::Named {
                        indent,
                        module,
                        default,
                        names,
                        quote,
                        semicolon,
                    })),
                }
            }
        }
    }

    /// One statement or blank line per line, each terminated by `eol`.
    pub fn render(&self, eol: &str) -> String {
        self.entries
            .iter()
            .map(|entry| match entry {
                Some(statement) => format!("{}{}", statement.render(), eol),
                None => eol.to_string(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Option
// ---------------------------------------------------------------------------

/// Merges pairs where both sides only touch import statements.
#[derive(Debug, Clone, Default)]
pub struct ImportResolveOption {
    /// Lowercase file extensions this option applies to; empty means all.
    extensions: Vec<String>,
}

impl ImportResolveOption {
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn applies_to(&self, ctx: &ConflictContext<'_>) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        ctx.header()
            .extension()
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    fn only_imports(text: &str) -> bool {
        !text.trim().is_empty()
            && text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .all(is_import_line)
    }
}

impl ResolveOption for ImportResolveOption {
    fn name(&self) -> &'static str {
        NAME
    }

    fn position(&self) -> u32 {
        200
    }

    fn can_resolve(&self, ctx: &ConflictContext<'_>) -> bool {
        if !self.applies_to(ctx)
            || !Self::only_imports(ctx.new_text(ConflictSide::Yours))
            || !Self::only_imports(ctx.new_text(ConflictSide::Theirs))
        {
            return false;
        }
        match self.merged_text(ctx) {
            Ok(_) => true,
            Err(err) => {
                debug!(path = ctx.header().path(), error = %err, "import merge not possible");
                false
            }
        }
    }

    fn merged_text(&self, ctx: &ConflictContext<'_>) -> Result<String, ResolveError> {
        let yours = ctx.side_version(ConflictSide::Yours);
        let theirs = ctx.side_version(ConflictSide::Theirs);
        let eol = LineEnding::detect(&yours, LineEnding::Unix);

        // YOURS keeps its layout; THEIRS only contributes statements.
        let mut set = ImportSet::default();
        for line in yours.lines() {
            if line.trim().is_empty() {
                set.add_separator();
            } else {
                set.add(ImportStatement::parse(line)?);
            }
        }
        for line in theirs.lines().filter(|line| !line.trim().is_empty()) {
            set.add(ImportStatement::parse(line)?);
        }
        Ok(set.render(eol.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{FileDiff, FileDiffHeader, SimilarLineDiffer};

    fn diffs(path: &str, base: &str, yours: &str, theirs: &str) -> (FileDiff, FileDiff) {
        let differ = SimilarLineDiffer::default();
        let header = FileDiffHeader::modified(path);
        (
            FileDiff::new(header.clone(), base, yours, &differ),
            FileDiff::new(header, base, theirs, &differ),
        )
    }

    #[test]
    fn test_patterns_compile() {
        assert!(syntax().is_some());
    }

    #[test]
    fn test_import_line_detection() {
        assert!(is_import_line("import A;"));
        assert!(is_import_line("import static org.junit.Assert.*;"));
        assert!(is_import_line("import { a, b } from './mod';"));
        assert!(is_import_line("import React from \"react\""));
        assert!(is_import_line("import './styles.css';"));
        assert!(is_import_line("from os import path, sep"));
        assert!(is_import_line("pub(crate) use std::fmt;"));
        assert!(!is_import_line("public class Main {}"));
        assert!(!is_import_line("const x = require('x');"));
    }

    #[test]
    fn test_java_imports_are_unioned() {
        let base = "public class Main {}\n";
        let (yours, theirs) = diffs(
            "Main.java",
            base,
            "import A;\npublic class Main {}\n",
            "import B;\npublic class Main {}\n",
        );
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        let option = ImportResolveOption::default();
        assert!(option.can_resolve(&ctx));
        assert_eq!(option.merged_text(&ctx).unwrap(), "import A;\nimport B;\n");
    }

    #[test]
    fn test_js_named_imports_are_combined() {
        let base = "import { a } from './util';\nrun();\n";
        let (yours, theirs) = diffs(
            "app.js",
            base,
            "import { a, b } from './util';\nrun();\n",
            "import { a, c } from './util';\nimport x from 'x';\nrun();\n",
        );
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        let option = ImportResolveOption::new(vec![".JS".into()]);
        assert!(option.can_resolve(&ctx));
        assert_eq!(
            option.merged_text(&ctx).unwrap(),
            "import { a, b, c } from './util';\nimport x from 'x';\n"
        );
    }

    #[test]
    fn test_blank_lines_between_imports_are_kept() {
        let base = "class Main {}\n";
        let (yours, theirs) = diffs(
            "Main.java",
            base,
            "import A;\n\nimport C;\nclass Main {}\n",
            "import B;\nclass Main {}\n",
        );
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        let option = ImportResolveOption::default();
        assert!(option.can_resolve(&ctx));
        assert_eq!(
            option.merged_text(&ctx).unwrap(),
            "import A;\n\nimport C;\nimport B;\n"
        );
    }

    #[test]
    fn test_extension_filter() {
        let (yours, theirs) = diffs("Main.java", "x();\n", "import A;\nx();\n", "import B;\nx();\n");
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        assert!(!ImportResolveOption::new(vec!["ts".into()]).can_resolve(&ctx));
    }

    #[test]
    fn test_parse_failure_means_cannot_resolve() {
        let (yours, theirs) = diffs(
            "app.js",
            "run();\n",
            "import { a, b from './util';\nrun();\n",
            "import c from './c';\nrun();\n",
        );
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        let option = ImportResolveOption::default();
        assert!(!option.can_resolve(&ctx));
        assert!(matches!(
            option.merged_text(&ctx),
            Err(ResolveError::StructuralParse { .. })
        ));
    }

    #[test]
    fn test_non_import_lines_do_not_match() {
        let (yours, theirs) = diffs("a.py", "x = 1\n", "import os\nx = 1\n", "y = 2\nx = 1\n");
        let ctx = ConflictContext::new(&yours, &theirs, 0, 0).unwrap();
        assert!(!ImportResolveOption::default().can_resolve(&ctx));
    }

    #[test]
    fn test_duplicate_plain_imports_kept_once() {
        let mut set = ImportSet::default();
        for line in ["import a.B;", "import a.C;", "import a.B;"] {
            set.add(ImportStatement::parse(line).unwrap());
        }
        assert_eq!(set.render("\n"), "import a.B;\nimport a.C;\n");
    }
}
