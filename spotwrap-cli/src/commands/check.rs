//! Implementation of the 'check' subcommand.

use std::path::Path;

use spotwrap_core::check_readiness;

use crate::error::CliResult;
use crate::terminal;

/// Checks spotDL and FFmpeg. Exit status 0 when spotDL can run.
pub fn run_check(spotdl: &Path, json: bool) -> CliResult<i32> {
    let report = check_readiness(spotdl);
    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| crate::cli_error!("Failed to serialize report: {e}"))?;
        println!("{text}");
    } else {
        terminal::print_readiness(&report);
    }
    Ok(if report.is_ready() { 0 } else { 1 })
}
