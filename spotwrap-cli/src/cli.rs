// spotwrap-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use spotwrap_core::{AudioFormat, Bitrate, Operation, OverwritePolicy};
use std::path::PathBuf;

/// Output directory used when neither a flag nor the environment names one.
pub const DEFAULT_OUTPUT_DIR: &str = "spotdl_downloads";

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Spotwrap: a friendlier front-end for spotDL",
    long_about = "Downloads, saves, syncs and resolves Spotify links by driving the spotDL \
                  command-line tool. Run without a subcommand for the interactive menu."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the spotDL executable
    #[arg(long, global = true, value_name = "PATH", env = "SPOTWRAP_SPOTDL", default_value = "spotdl")]
    pub spotdl: PathBuf,

    /// Enable detailed logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Write a log file with the command and full spotDL output to this directory
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print the result as JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download songs as audio files
    Download(OperationArgs),

    /// Save track metadata to a .spotdl file without downloading audio
    Save(OperationArgs),

    /// Sync a local folder with a playlist or .spotdl file (removes songs no longer listed)
    Sync(OperationArgs),

    /// Print the direct download URLs without downloading
    Url(OperationArgs),

    /// Check that spotDL and FFmpeg are installed
    Check,

    /// Start the interactive menu
    Menu,
}

impl Commands {
    /// The spotDL operation behind a one-shot subcommand.
    pub fn operation(&self) -> Option<(Operation, &OperationArgs)> {
        match self {
            Commands::Download(args) => Some((Operation::Download, args)),
            Commands::Save(args) => Some((Operation::SaveMetadata, args)),
            Commands::Sync(args) => Some((Operation::Sync, args)),
            Commands::Url(args) => Some((Operation::GetUrls, args)),
            Commands::Check | Commands::Menu => None,
        }
    }

    /// Short name used in log file names.
    pub fn name(&self) -> &'static str {
        match self.operation() {
            Some((operation, _)) => operation.subcommand(),
            None if matches!(self, Commands::Check) => "check",
            None => "menu",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OperationArgs {
    /// Spotify URLs (track, album, playlist, artist) or .spotdl files
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Directory where songs are saved (created if missing)
    #[arg(short, long, value_name = "OUTPUT_DIR", env = "SPOTWRAP_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Audio format: mp3, m4a, flac, opus, wav, aac or any other format spotDL accepts
    #[arg(short, long, value_name = "FORMAT", default_value = "mp3")]
    pub format: AudioFormat,

    /// Bitrate: best (0), auto, disable, a preset such as 320k, or a custom value
    #[arg(short, long, value_name = "BITRATE", default_value = "best")]
    pub bitrate: Bitrate,

    /// Number of concurrent download threads
    #[arg(short, long, value_name = "N", default_value_t = spotwrap_core::config::DEFAULT_THREADS,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: u32,

    /// How to handle existing files: skip, force or metadata
    #[arg(long, value_name = "POLICY", default_value = "skip")]
    pub overwrite: OverwritePolicy,

    /// Do not embed lyrics
    #[arg(long)]
    pub no_lyrics: bool,

    /// Do not embed metadata (album art, track info)
    #[arg(long)]
    pub no_metadata: bool,

    /// Remove non-music segments with SponsorBlock (YouTube sources only)
    #[arg(long)]
    pub sponsor_block: bool,

    /// Archive file listing songs to skip because they were downloaded before
    #[arg(long, value_name = "FILE")]
    pub archive: Option<PathBuf>,

    /// .spotdl file to write track metadata or sync state to
    #[arg(long, value_name = "FILE")]
    pub save_file: Option<PathBuf>,

    /// First playlist/album entry to download (1-based)
    #[arg(long, value_name = "N")]
    pub playlist_start: Option<u32>,

    /// Last playlist/album entry to download (1-based, inclusive)
    #[arg(long, value_name = "N")]
    pub playlist_end: Option<u32>,

    /// Custom search query used instead of the Spotify metadata (single target only)
    #[arg(long, value_name = "QUERY")]
    pub search_query: Option<String>,

    /// Additional spotDL arguments, quoted as in a shell (e.g. "--ffmpeg-args '-vn'")
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub extra_args: Option<String>,

    /// Working directory for spotDL
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Print the spotDL command without running it
    #[arg(long)]
    pub dry_run: bool,
}
