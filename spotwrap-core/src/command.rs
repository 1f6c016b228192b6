// ============================================================================
// spotwrap-core/src/command.rs
// ============================================================================
//
// ARGUMENT BUILDER: DownloadConfiguration -> spotDL argument vector
//
// This module turns a validated configuration, an operation and a list of
// targets into the exact argument vector passed to spotDL. Every value is a
// separate token; nothing is joined into a shell string, so spaces or shell
// metacharacters in paths and queries reach spotDL unchanged.
//
// TOKEN ORDER:
//   subcommand, --output, --format, --bitrate, --threads, overwrite flag,
//   --lyrics / --embed-metadata / --sponsor-block, --archive, --save-file,
//   --playlist-start / --playlist-end, --search-query, extra arguments,
//   targets

use std::path::{Path, PathBuf};

use crate::config::{DownloadConfiguration, SPOTDL_FILE_EXTENSION};
use crate::error::ValidationError;
use crate::operation::{Operation, is_state_file};

/// Builds the spotDL argument vector (without the program name).
///
/// Fails before anything is spawned when the targets are empty, the thread
/// count is zero, a custom format or bitrate is blank, a search query is
/// combined with several targets, or `save` has no save file.
///
/// # Examples
///
/// ```rust
/// use spotwrap_core::{build_arguments, DownloadConfiguration, Operation};
/// use std::path::PathBuf;
///
/// let config = DownloadConfiguration::new(PathBuf::from("music"));
/// let targets = vec!["https://open.spotify.com/track/abc".to_string()];
/// let args = build_arguments(Operation::GetUrls, &config, &targets).unwrap();
///
/// assert_eq!(
///     args,
///     ["url", "--output", "music", "--threads", "4", "https://open.spotify.com/track/abc"]
/// );
/// ```
pub fn build_arguments<S: AsRef<str>>(
    operation: Operation,
    config: &DownloadConfiguration,
    targets: &[S],
) -> Result<Vec<String>, ValidationError> {
    SpotdlArgsBuilder::new(operation, config).build(targets)
}

/// Step-by-step builder behind [`build_arguments`].
pub struct SpotdlArgsBuilder<'a> {
    operation: Operation,
    config: &'a DownloadConfiguration,
    args: Vec<String>,
}

impl<'a> SpotdlArgsBuilder<'a> {
    pub fn new(operation: Operation, config: &'a DownloadConfiguration) -> Self {
        Self {
            operation,
            config,
            args: Vec::new(),
        }
    }

    /// Validates the inputs and produces the final token list.
    pub fn build<S: AsRef<str>>(mut self, targets: &[S]) -> Result<Vec<String>, ValidationError> {
        if targets.is_empty() {
            return Err(ValidationError::EmptyTargets);
        }
        let config = self.config;
        let operation = self.operation;
        config.validate()?;

        let search_query = config.effective_search_query();
        if search_query.is_some() && targets.len() > 1 {
            return Err(ValidationError::SearchQueryWithMultipleTargets(targets.len()));
        }

        self.push(operation.subcommand());
        self.push_pair("--output", path_token(&config.output_dir));

        if operation.uses_encoding() {
            self.push_pair("--format", config.format.token()?);
            self.push_pair("--bitrate", config.bitrate.token()?);
        }

        self.push_pair("--threads", config.threads.to_string());

        if operation.uses_overwrite() {
            for flag in config.overwrite.flags() {
                self.push(*flag);
            }
        }

        if operation.uses_encoding() {
            self.push_if(config.embed_lyrics, "--lyrics");
            self.push_if(config.embed_metadata, "--embed-metadata");
            self.push_if(config.sponsorblock, "--sponsor-block");
        }

        if let Some(archive) = &config.archive_file {
            self.push_pair("--archive", path_token(archive));
        }

        self.push_save_file(targets)?;

        if operation.uses_playlist_range() {
            if let Some(start) = config.playlist_start {
                self.push_pair("--playlist-start", start.to_string());
            }
            if let Some(end) = config.playlist_end {
                self.push_pair("--playlist-end", end.to_string());
            }
        }

        if let Some(query) = search_query {
            self.push_pair("--search-query", query);
        }

        // Passthrough tokens are already split by the caller
        self.args.extend(config.extra_args.iter().cloned());
        self.args.extend(targets.iter().map(|t| t.as_ref().to_string()));

        log::debug!(
            "Built spotdl arguments for {}: {:?}",
            operation.display_name(),
            self.args
        );
        Ok(self.args)
    }

    fn push_save_file<S: AsRef<str>>(&mut self, targets: &[S]) -> Result<(), ValidationError> {
        let config = self.config;
        match self.operation {
            Operation::SaveMetadata => {
                let save_file = config
                    .save_file
                    .as_deref()
                    .filter(|p| !p.as_os_str().is_empty())
                    .ok_or(ValidationError::MissingSaveFile)?;
                self.push_pair("--save-file", path_token(&with_state_extension(save_file)));
            }
            Operation::Sync => {
                // spotDL updates an existing state file in place
                let syncing_state_file = matches!(targets, [only] if is_state_file(only.as_ref()));
                if let Some(save_file) = config.save_file.as_deref() {
                    if !syncing_state_file && !save_file.as_os_str().is_empty() {
                        self.push_pair(
                            "--save-file",
                            path_token(&with_state_extension(save_file)),
                        );
                    }
                }
            }
            Operation::Download | Operation::GetUrls => {}
        }
        Ok(())
    }

    fn push(&mut self, token: impl Into<String>) {
        self.args.push(token.into());
    }

    fn push_pair(&mut self, flag: &str, value: impl Into<String>) {
        self.args.push(flag.to_string());
        self.args.push(value.into());
    }

    fn push_if(&mut self, condition: bool, flag: &str) {
        if condition {
            self.push(flag);
        }
    }
}

/// Appends `.spotdl` to a state-file path that lacks it.
pub fn with_state_extension(path: &Path) -> PathBuf {
    if is_state_file(&path.to_string_lossy()) {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(SPOTDL_FILE_EXTENSION);
        PathBuf::from(name)
    }
}

fn path_token(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
