//! The four spotDL operations and the target list they act on.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SPOTDL_FILE_EXTENSION;
use crate::error::ValidationError;

/// A high-level action, each mapping to one spotDL subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Download songs as audio files.
    Download,
    /// Write track metadata to a `.spotdl` file without downloading audio.
    SaveMetadata,
    /// Bring a local folder in line with a playlist or `.spotdl` file.
    Sync,
    /// Print the direct source URLs without downloading.
    GetUrls,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Download,
        Operation::SaveMetadata,
        Operation::Sync,
        Operation::GetUrls,
    ];

    /// spotDL subcommand name.
    pub fn subcommand(self) -> &'static str {
        match self {
            Operation::Download => "download",
            Operation::SaveMetadata => "save",
            Operation::Sync => "sync",
            Operation::GetUrls => "url",
        }
    }

    /// Human-readable name used in status lines.
    pub fn display_name(self) -> &'static str {
        match self {
            Operation::Download => "Download",
            Operation::SaveMetadata => "Save Metadata",
            Operation::Sync => "Sync",
            Operation::GetUrls => "Get Direct URLs",
        }
    }

    /// Whether format, bitrate and the embedding toggles apply.
    pub fn uses_encoding(self) -> bool {
        !matches!(self, Operation::GetUrls)
    }

    /// Whether the overwrite policy applies.
    pub fn uses_overwrite(self) -> bool {
        matches!(self, Operation::Download | Operation::Sync)
    }

    /// Whether playlist start/end indices apply.
    pub fn uses_playlist_range(self) -> bool {
        matches!(self, Operation::Download)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered, non-empty list of URLs or `.spotdl` paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSet(Vec<String>);

impl TargetSet {
    /// Creates a target set, dropping blank entries and keeping order.
    pub fn new<I, S>(targets: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if targets.is_empty() {
            return Err(ValidationError::EmptyTargets);
        }
        Ok(Self(targets))
    }

    /// Splits free text on whitespace (spaces or newlines) into targets.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::new(input.split_whitespace())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// True when the set is a single local `.spotdl` state file.
    pub fn is_single_state_file(&self) -> bool {
        match self.0.as_slice() {
            [only] => is_state_file(only),
            _ => false,
        }
    }

    /// True if any target looks like a playlist or album link.
    pub fn has_collection(&self) -> bool {
        self.0.iter().any(|t| {
            let lower = t.to_lowercase();
            lower.contains("playlist") || lower.contains("album")
        })
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) fn is_state_file(target: &str) -> bool {
    Path::new(target)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SPOTDL_FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcommands() {
        let names: Vec<_> = Operation::ALL.iter().map(|op| op.subcommand()).collect();
        assert_eq!(names, vec!["download", "save", "sync", "url"]);
    }

    #[test]
    fn test_target_set_parse() {
        let targets = TargetSet::parse("  https://a  \n https://b\thttps://c ").unwrap();
        assert_eq!(targets.as_slice(), &["https://a", "https://b", "https://c"]);
        assert_eq!(TargetSet::parse(" \n "), Err(ValidationError::EmptyTargets));
    }

    #[test]
    fn test_state_file_detection() {
        assert!(TargetSet::new(["My Playlist.SPOTDL"]).unwrap().is_single_state_file());
        assert!(!TargetSet::new(["https://open.spotify.com/playlist/x"])
            .unwrap()
            .is_single_state_file());
        assert!(!TargetSet::new(["a.spotdl", "b.spotdl"]).unwrap().is_single_state_file());
    }

    #[test]
    fn test_collection_detection() {
        assert!(TargetSet::new(["https://open.spotify.com/album/1"]).unwrap().has_collection());
        assert!(!TargetSet::new(["https://open.spotify.com/track/1"]).unwrap().has_collection());
    }
}
