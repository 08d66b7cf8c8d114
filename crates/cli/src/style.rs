//! Shared styling utilities for terminal output.

use console::Style;

use mergeresolve_core::conflict::ConflictType;
use mergeresolve_core::FileOutcome;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create an error-styled string (red with cross).
pub fn error(msg: &str) -> String {
    let style = Style::new().red();
    format!("{} {}", style.apply_to("✗"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold).
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Colored label for a per-file outcome.
pub fn outcome(outcome: &FileOutcome) -> String {
    let style = match outcome {
        FileOutcome::Resolved { .. } => Style::new().green(),
        FileOutcome::StillConflicting { .. } => Style::new().red().bold(),
        FileOutcome::Skipped { .. } => Style::new().dim(),
        FileOutcome::Failed { .. } => Style::new().red(),
    };
    style.apply_to(outcome.label()).to_string()
}

/// Colored label for a pair classification.
pub fn conflict_type(conflict: &ConflictType) -> String {
    let style = match conflict {
        ConflictType::None => Style::new().dim(),
        ConflictType::Same => Style::new().cyan(),
        ConflictType::Resolvable(_) => Style::new().green(),
        ConflictType::Conflicting => Style::new().red().bold(),
    };
    style.apply_to(conflict.to_string()).to_string()
}
