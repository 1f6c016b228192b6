// ============================================================================
// spotwrap-core/src/summary.rs
// ============================================================================
//
// OUTPUT SCANNING: Advisory detection of skipped/failed songs
//
// spotDL reports individual song failures as free text while still exiting
// normally. This module scans a transcript for the known phrases so the
// front-ends can list the affected songs. The result is advisory only: it is
// never used to decide success or failure of an invocation.
//
// RECOGNISED PATTERNS:
// - "Could not find a match for: <song>"
// - "Failed to download: <song>"
// - "Track found but download failed: <song>"
// - "AudioProviderError: ..." with a YouTube URL on the same or the next
//   three lines

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static EXPLICIT_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:Could not find a match for|Failed to download|Track found but download failed):\s*(.*?)(?::.*)?$",
    )
    .expect("valid failure pattern")
});

static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:music\.)?youtube\.com/watch\?v=[\w-]+")
        .expect("valid youtube pattern")
});

const AUDIO_PROVIDER_ERROR: &str = "AudioProviderError:";

/// Lines after an `AudioProviderError` searched for the offending URL.
const URL_LOOKAHEAD: usize = 3;

/// Sorted, de-duplicated list of songs reported as skipped or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    entries: BTreeSet<String>,
}

impl FailureReport {
    /// Scans transcript lines in order.
    pub fn scan<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lines: Vec<&str> = lines.into_iter().collect();
        let mut entries = BTreeSet::new();

        for (i, line) in lines.iter().enumerate() {
            if let Some(captures) = EXPLICIT_FAILURE.captures(line) {
                let song = captures.get(1).map_or("", |m| m.as_str()).trim();
                if !song.is_empty() {
                    entries.insert(song.to_string());
                }
                continue;
            }

            if line.contains(AUDIO_PROVIDER_ERROR) {
                let window_end = (i + URL_LOOKAHEAD + 1).min(lines.len());
                let url = lines[i..window_end]
                    .iter()
                    .find_map(|candidate| YOUTUBE_URL.find(candidate));
                let entry = match url {
                    Some(url) => format!(
                        "Download failed for YouTube URL: {} (AudioProviderError)",
                        url.as_str()
                    ),
                    None => format!(
                        "Download failed due to AudioProviderError (details in log: '{}')",
                        line.trim()
                    ),
                };
                entries.insert(entry);
            }
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
