//! Configuration structures and constants for the spotwrap-core library.
//!
//! This module holds the download configuration collected by a front-end
//! (menu prompts or command-line flags) together with the enums for audio
//! format, bitrate and overwrite policy. Values are kept in memory only; the
//! core never reads or writes configuration files.

mod builder;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use builder::DownloadConfigurationBuilder;

// Default constants

/// Default number of parallel downloads handed to spotDL.
pub const DEFAULT_THREADS: u32 = 4;

/// Extension spotDL uses for its metadata/sync state files.
pub const SPOTDL_FILE_EXTENSION: &str = "spotdl";

/// Audio container/codec spotDL should produce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
    Flac,
    Opus,
    Wav,
    Aac,
    /// Any other format spotDL understands, entered by the user.
    Custom(String),
}

impl AudioFormat {
    /// The named formats offered in menus, in display order.
    pub const NAMED: [AudioFormat; 6] = [
        AudioFormat::Mp3,
        AudioFormat::M4a,
        AudioFormat::Flac,
        AudioFormat::Opus,
        AudioFormat::Wav,
        AudioFormat::Aac,
    ];

    /// Returns the value passed after `--format`.
    pub fn token(&self) -> Result<String, ValidationError> {
        let token = match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
            AudioFormat::Wav => "wav",
            AudioFormat::Aac => "aac",
            AudioFormat::Custom(value) => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ValidationError::MissingCustomFormat);
                }
                return Ok(value.to_lowercase());
            }
        };
        Ok(token.to_string())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token() {
            Ok(token) => f.write_str(&token),
            Err(_) => f.write_str("custom"),
        }
    }
}

impl FromStr for AudioFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let format = match value.as_str() {
            "" => return Err(ValidationError::MissingCustomFormat),
            "mp3" => AudioFormat::Mp3,
            "m4a" => AudioFormat::M4a,
            "flac" => AudioFormat::Flac,
            "opus" => AudioFormat::Opus,
            "wav" => AudioFormat::Wav,
            "aac" => AudioFormat::Aac,
            _ => AudioFormat::Custom(value),
        };
        Ok(format)
    }
}

/// Target bitrate for transcoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bitrate {
    /// Highest quality the source allows (spotDL quality level `0`).
    #[default]
    Best,
    /// Let spotDL pick a bitrate matching the source.
    Auto,
    /// Keep the source stream without re-encoding the bitrate.
    Disable,
    /// Fixed bitrate in kbit/s, e.g. 320 for `320k`.
    Kbps(u16),
    /// Any other value spotDL accepts (`192k`, quality levels `1`-`9`, ...).
    Custom(String),
}

impl Bitrate {
    /// The presets offered in menus, in display order.
    pub const PRESETS: [Bitrate; 6] = [
        Bitrate::Best,
        Bitrate::Kbps(320),
        Bitrate::Kbps(256),
        Bitrate::Kbps(128),
        Bitrate::Auto,
        Bitrate::Disable,
    ];

    /// Returns the value passed after `--bitrate`.
    pub fn token(&self) -> Result<String, ValidationError> {
        match self {
            Bitrate::Best => Ok("0".to_string()),
            Bitrate::Auto => Ok("auto".to_string()),
            Bitrate::Disable => Ok("disable".to_string()),
            Bitrate::Kbps(rate) => Ok(format!("{rate}k")),
            Bitrate::Custom(value) => {
                let value = value.trim();
                if value.is_empty() {
                    Err(ValidationError::MissingCustomBitrate)
                } else {
                    Ok(value.to_lowercase())
                }
            }
        }
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bitrate::Best => f.write_str("best"),
            Bitrate::Custom(value) if value.trim().is_empty() => f.write_str("custom"),
            other => match other.token() {
                Ok(token) => f.write_str(&token),
                Err(_) => f.write_str("custom"),
            },
        }
    }
}

impl FromStr for Bitrate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let bitrate = match value.as_str() {
            "" => return Err(ValidationError::MissingCustomBitrate),
            "best" | "0" => Bitrate::Best,
            "auto" => Bitrate::Auto,
            "disable" => Bitrate::Disable,
            other => match other.strip_suffix('k').and_then(|n| n.parse::<u16>().ok()) {
                Some(rate) if rate > 0 => Bitrate::Kbps(rate),
                _ => Bitrate::Custom(value),
            },
        };
        Ok(bitrate)
    }
}

/// What spotDL does when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Leave existing files untouched.
    #[default]
    Skip,
    /// Download again and replace the file.
    Force,
    /// Keep the audio but rewrite its tags.
    Metadata,
}

impl OverwritePolicy {
    pub const ALL: [OverwritePolicy; 3] = [
        OverwritePolicy::Skip,
        OverwritePolicy::Force,
        OverwritePolicy::Metadata,
    ];

    /// Flag tokens emitted for this policy.
    pub fn flags(self) -> &'static [&'static str] {
        match self {
            OverwritePolicy::Skip => &["--skip-existing"],
            OverwritePolicy::Force => &["--overwrite", "force"],
            OverwritePolicy::Metadata => &["--overwrite", "metadata"],
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverwritePolicy::Skip => "skip",
            OverwritePolicy::Force => "force",
            OverwritePolicy::Metadata => "metadata",
        })
    }
}

impl FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(OverwritePolicy::Skip),
            "force" => Ok(OverwritePolicy::Force),
            "metadata" | "metadata-only" => Ok(OverwritePolicy::Metadata),
            other => Err(format!(
                "unknown overwrite policy '{other}' (expected skip, force or metadata)"
            )),
        }
    }
}

/// Everything a front-end collects before running spotDL.
///
/// Paths are passed through as given; whether they exist is for the
/// filesystem and spotDL to decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfiguration {
    // ---- Output ----

    /// Directory spotDL writes audio files into
    pub output_dir: PathBuf,

    // ---- Encoding ----

    pub format: AudioFormat,

    pub bitrate: Bitrate,

    /// Number of parallel downloads (at least 1)
    pub threads: u32,

    pub overwrite: OverwritePolicy,

    // ---- Embedding ----

    pub embed_lyrics: bool,

    pub embed_metadata: bool,

    /// Strip non-music segments using SponsorBlock (YouTube sources only)
    pub sponsorblock: bool,

    // ---- State Files ----

    /// File listing already-downloaded songs, skipped on later runs
    pub archive_file: Option<PathBuf>,

    /// `.spotdl` state file written by `save` and `sync`
    pub save_file: Option<PathBuf>,

    // ---- Matching ----

    /// Search query used instead of the target's own metadata
    pub search_query: Option<String>,

    /// First playlist/album entry to download (1-based)
    pub playlist_start: Option<u32>,

    /// Last playlist/album entry to download (1-based, inclusive)
    pub playlist_end: Option<u32>,

    // ---- Passthrough ----

    /// Already-tokenized arguments appended verbatim
    pub extra_args: Vec<String>,

    /// Working directory for the child process; inherited when `None`
    pub working_dir: Option<PathBuf>,
}

impl Default for DownloadConfiguration {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            format: AudioFormat::default(),
            bitrate: Bitrate::default(),
            threads: DEFAULT_THREADS,
            overwrite: OverwritePolicy::default(),
            embed_lyrics: true,
            embed_metadata: true,
            sponsorblock: false,
            archive_file: None,
            save_file: None,
            search_query: None,
            playlist_start: None,
            playlist_end: None,
            extra_args: Vec::new(),
            working_dir: None,
        }
    }
}

impl DownloadConfiguration {
    /// Creates a configuration with defaults and the given output directory.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Self::default()
        }
    }

    /// Checks the invariants that do not depend on the operation or targets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.threads < 1 {
            return Err(ValidationError::ZeroThreads);
        }
        self.format.token()?;
        self.bitrate.token()?;

        if self.playlist_start == Some(0) {
            return Err(ValidationError::ZeroPlaylistIndex("start"));
        }
        if self.playlist_end == Some(0) {
            return Err(ValidationError::ZeroPlaylistIndex("end"));
        }
        if let (Some(start), Some(end)) = (self.playlist_start, self.playlist_end) {
            if start > end {
                return Err(ValidationError::InvalidPlaylistRange { start, end });
            }
        }
        Ok(())
    }

    /// The search query, if one was entered and is not blank.
    pub fn effective_search_query(&self) -> Option<&str> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}
