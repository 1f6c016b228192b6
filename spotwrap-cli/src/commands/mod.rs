//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Dependency check (`spotwrap check`).
pub mod check;

/// Interactive numbered menu (`spotwrap menu`, or no subcommand).
pub mod menu;

/// One-shot operations: `download`, `save`, `sync` and `url`.
pub mod run;

use spotwrap_core::ValidationError;

/// Splits the free-text "additional arguments" field with POSIX shell
/// quoting rules. Blank input yields no arguments.
pub fn parse_extra_args(raw: &str) -> Result<Vec<String>, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    shlex::split(text).ok_or_else(|| ValidationError::MalformedExtraArgs(text.to_string()))
}
