// ============================================================================
// spotwrap-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: fern Dispatch for Console and Log File
//
// All diagnostics go through the `log` facade. The console dispatch prints
// warnings (or everything from debug up with --verbose) to stderr. When a
// log directory is given, a second dispatch writes a plain-text log file
// that also carries the spotDL transcript, logged under TRANSCRIPT_TARGET.
//
// USAGE:
// - SPOTWRAP_LOG=debug|info|warn|error overrides the console level
// - --log-dir DIR writes DIR/spotwrap_<command>_<YYYYMMDD_HHMMSS>.log

// ---- External crate imports ----
use log::LevelFilter;
use owo_colors::OwoColorize;

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Log target carrying spotDL's own output lines. Only the log file shows
/// these; the console prints them directly.
pub const TRANSCRIPT_TARGET: &str = "spotdl";

/// Environment variable overriding the console log level.
pub const LOG_LEVEL_ENV: &str = "SPOTWRAP_LOG";

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let name = format!("spotwrap_download_{}.log", spotwrap_cli::logging::get_timestamp());
/// assert!(name.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// File name of the log written for one command run.
pub fn log_file_name(command: &str) -> String {
    format!("spotwrap_{}_{}.log", command, get_timestamp())
}

/// Console level from the verbose flag, overridden by SPOTWRAP_LOG.
pub fn console_level(verbose: bool) -> LevelFilter {
    let from_env = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok());
    match from_env {
        Some(level) => level,
        None if verbose => LevelFilter::Debug,
        None => LevelFilter::Warn,
    }
}

/// Installs the global logger.
///
/// Returns the path of the log file when `log_dir` is set.
pub fn init_logging(
    level: LevelFilter,
    use_color: bool,
    log_dir: Option<&Path>,
    command: &str,
) -> CliResult<Option<PathBuf>> {
    let console = fern::Dispatch::new()
        .level(level)
        .filter(|metadata| metadata.target() != TRANSCRIPT_TARGET)
        .format(move |out, message, record| {
            let level = record.level();
            if use_color {
                let label = match level {
                    log::Level::Error => level.red().bold().to_string(),
                    log::Level::Warn => level.yellow().to_string(),
                    log::Level::Info => level.cyan().to_string(),
                    _ => level.dimmed().to_string(),
                };
                out.finish(format_args!("[{label}] {message}"))
            } else {
                out.finish(format_args!("[{level}] {message}"))
            }
        })
        .chain(std::io::stderr());

    let mut root = fern::Dispatch::new().chain(console);

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .cli_with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
            let path = dir.join(log_file_name(command));
            let file = fern::log_file(&path)
                .cli_with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            let file_dispatch = fern::Dispatch::new()
                .level(LevelFilter::Debug)
                .format(|out, message, record| {
                    let text = strip_ansi_escapes::strip_str(message.to_string());
                    out.finish(format_args!(
                        "{} {:<5} [{}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        text
                    ))
                })
                .chain(file);
            root = root.chain(file_dispatch);
            Some(path)
        }
        None => None,
    };

    root.apply()
        .map_err(|e| crate::cli_error!("Failed to initialize logging: {e}"))?;
    Ok(log_path)
}
