// ============================================================================
// spotwrap-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for DownloadConfiguration
//
// This module implements the builder pattern for DownloadConfiguration,
// providing a fluent API for front-ends that gather options one at a time
// (menu prompts, command-line flags). Unset options keep their defaults.
//
// KEY COMPONENTS:
// - DownloadConfigurationBuilder: Builder struct for DownloadConfiguration
// - build(): validates operation-independent invariants

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{AudioFormat, Bitrate, DownloadConfiguration, OverwritePolicy};
use crate::error::ValidationError;

/// Builder for creating DownloadConfiguration instances.
///
/// # Examples
///
/// ```rust
/// use spotwrap_core::config::{AudioFormat, Bitrate, DownloadConfigurationBuilder};
/// use std::path::PathBuf;
///
/// let config = DownloadConfigurationBuilder::new()
///     .output_dir(PathBuf::from("music"))
///     .format(AudioFormat::Flac)
///     .bitrate(Bitrate::Kbps(320))
///     .threads(8)
///     .sponsorblock(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.threads, 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DownloadConfigurationBuilder {
    config: DownloadConfiguration,
}

impl DownloadConfigurationBuilder {
    /// Creates a new builder starting from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory spotDL writes into.
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output_dir = output_dir;
        self
    }

    pub fn format(mut self, format: AudioFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn bitrate(mut self, bitrate: Bitrate) -> Self {
        self.config.bitrate = bitrate;
        self
    }

    /// Sets the number of parallel downloads.
    pub fn threads(mut self, threads: u32) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    pub fn embed_lyrics(mut self, enabled: bool) -> Self {
        self.config.embed_lyrics = enabled;
        self
    }

    pub fn embed_metadata(mut self, enabled: bool) -> Self {
        self.config.embed_metadata = enabled;
        self
    }

    pub fn sponsorblock(mut self, enabled: bool) -> Self {
        self.config.sponsorblock = enabled;
        self
    }

    /// Sets the archive file used to skip songs downloaded earlier.
    pub fn archive_file(mut self, path: Option<PathBuf>) -> Self {
        self.config.archive_file = path;
        self
    }

    /// Sets the `.spotdl` state file for `save` and `sync`.
    pub fn save_file(mut self, path: Option<PathBuf>) -> Self {
        self.config.save_file = path;
        self
    }

    pub fn search_query(mut self, query: Option<String>) -> Self {
        self.config.search_query = query;
        self
    }

    /// Restricts playlist/album downloads to a 1-based inclusive range.
    pub fn playlist_range(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        self.config.playlist_start = start;
        self.config.playlist_end = end;
        self
    }

    /// Appends already-tokenized passthrough arguments.
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.working_dir = dir;
        self
    }

    /// Builds the configuration, checking operation-independent invariants.
    pub fn build(self) -> Result<DownloadConfiguration, ValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
