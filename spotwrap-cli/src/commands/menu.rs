// ============================================================================
// spotwrap-cli/src/commands/menu.rs
// ============================================================================
//
// INTERACTIVE MENU: Numbered Menu Driving the Four spotDL Operations
//
// The menu asks for targets and options with defaults, builds a validated
// configuration and hands the job to a Session. Prompts go through Prompter,
// so the whole dialogue can be replayed from scripted input in tests.
//
// KEY COMPONENTS:
// - Menu: prompt dialogue producing MenuJob values
// - run_loop: main menu loop, exits on choice 5 or end of input
// - run_menu: entry point wiring the loop to stdin/stdout and a Session

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::info;
use spotwrap_core::{
    AudioFormat, Bitrate, CoreError, DownloadConfiguration, DownloadConfigurationBuilder,
    Operation, OverwritePolicy, Session, TargetSet, with_state_extension,
};

use super::parse_extra_args;
use super::run::start_armed;
use crate::cli::DEFAULT_OUTPUT_DIR;
use crate::error::{CliErrorContext, CliResult};
use crate::interrupt::InterruptSlot;
use crate::prompt::Prompter;
use crate::terminal::{self, ConsoleSink};

const TARGETS_PROMPT: &str =
    "Enter Spotify URLs (track, album, playlist, artist, separated by space or newline)";

/// Everything needed to run one operation chosen from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuJob {
    pub operation: Operation,
    pub config: DownloadConfiguration,
    pub targets: TargetSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Run(Operation),
    Exit,
}

pub struct Menu<R, W> {
    prompter: Prompter<R, W>,
    default_output: PathBuf,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            prompter: Prompter::new(input, output),
            default_output: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn with_default_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_output = dir.into();
        self
    }

    pub fn into_output(self) -> W {
        self.prompter.into_output()
    }

    /// Shows the main menu until a valid entry is picked.
    pub fn main_choice(&mut self) -> io::Result<MenuChoice> {
        let p = &mut self.prompter;
        loop {
            p.say("")?;
            p.say("--- spotDL Downloader ---")?;
            p.say("1. Download Songs (from Spotify URLs)")?;
            p.say("2. Save Metadata (generate .spotdl files for tracks/playlists)")?;
            p.say("3. Sync Playlist/Album (download new, remove deleted from local)")?;
            p.say("4. Get Direct Download URLs (view source URLs without downloading audio)")?;
            p.say("5. Exit")?;

            let choice = match p.ask("Enter your choice", None)?.as_str() {
                "1" => MenuChoice::Run(Operation::Download),
                "2" => MenuChoice::Run(Operation::SaveMetadata),
                "3" => MenuChoice::Run(Operation::Sync),
                "4" => MenuChoice::Run(Operation::GetUrls),
                "5" => MenuChoice::Exit,
                _ => {
                    p.say("Invalid choice. Please enter a number from the menu (1-5).")?;
                    continue;
                }
            };
            return Ok(choice);
        }
    }

    /// Runs the menu until the user exits or input ends.
    ///
    /// Validation errors from `execute` are shown and the menu continues;
    /// any other error ends the loop.
    pub fn run_loop<F>(&mut self, mut execute: F) -> CliResult<()>
    where
        F: FnMut(MenuJob) -> CliResult<()>,
    {
        loop {
            let choice = match self.main_choice() {
                Ok(choice) => choice,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            let operation = match choice {
                MenuChoice::Exit => {
                    self.prompter.say("Exiting spotDL downloader. Goodbye!")?;
                    return Ok(());
                }
                MenuChoice::Run(operation) => operation,
            };

            let job = match self.collect_job(operation) {
                Ok(Some(job)) => job,
                Ok(None) => continue,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            match execute(job) {
                Ok(()) => {}
                Err(CoreError::Validation(e)) => self.prompter.say(&format!("Error: {e}"))?,
                Err(e) => return Err(e),
            }
        }
    }

    /// Asks everything the operation needs. `None` means the user gave
    /// incomplete input; the reason has already been shown.
    pub fn collect_job(&mut self, operation: Operation) -> io::Result<Option<MenuJob>> {
        self.prompter
            .say(&format!("\n--- {} ---", operation.display_name()))?;

        let (targets, mut builder) = match operation {
            Operation::Download | Operation::SaveMetadata | Operation::GetUrls => {
                let Some(targets) = self.ask_targets(operation)? else {
                    return Ok(None);
                };
                (targets, DownloadConfigurationBuilder::new())
            }
            Operation::Sync => {
                let p = &mut self.prompter;
                let source = p.ask(
                    "Enter Spotify playlist URL OR path to a .spotdl file to sync",
                    None,
                )?;
                let Ok(targets) = TargetSet::new([source]) else {
                    p.say("No sync source provided. Aborting sync operation.")?;
                    return Ok(None);
                };
                let mut builder = DownloadConfigurationBuilder::new();
                if !targets.is_single_state_file() {
                    let save_file = p.ask(
                        "Enter a filename to save sync state for future syncs (e.g., 'my_playlist.spotdl', leave empty to skip)",
                        Some(""),
                    )?;
                    if !save_file.is_empty() {
                        builder = builder.save_file(Some(expand_home(&save_file)));
                    }
                }
                (targets, builder)
            }
        };

        match operation {
            Operation::Download => {
                builder = self.common_options(builder)?;
                builder = self.download_options(builder, &targets)?;
            }
            Operation::SaveMetadata => {
                let save_file = self.prompter.ask_required(
                    "Enter filename to save metadata (e.g., 'playlist_meta.spotdl')",
                    "A filename is required to save metadata.",
                )?;
                builder = builder
                    .save_file(Some(expand_home(&save_file)))
                    .output_dir(self.default_output.clone());
            }
            Operation::Sync => {
                builder = self.common_options(builder)?;
            }
            Operation::GetUrls => {
                builder = builder.output_dir(self.default_output.clone());
            }
        }

        builder = self.extra_args(builder)?;

        match builder.build() {
            Ok(config) => Ok(Some(MenuJob {
                operation,
                config,
                targets,
            })),
            Err(e) => {
                self.prompter.say(&format!("Error: {e}"))?;
                Ok(None)
            }
        }
    }

    fn ask_targets(&mut self, operation: Operation) -> io::Result<Option<TargetSet>> {
        let input = self.prompter.ask(TARGETS_PROMPT, None)?;
        match TargetSet::parse(&input) {
            Ok(targets) => Ok(Some(targets)),
            Err(_) => {
                self.prompter.say(&format!(
                    "No Spotify URLs provided. Aborting {}.",
                    operation.display_name().to_lowercase()
                ))?;
                Ok(None)
            }
        }
    }

    /// Output, encoding, embedding, overwrite and thread questions shared by
    /// download and sync.
    fn common_options(
        &mut self,
        mut builder: DownloadConfigurationBuilder,
    ) -> io::Result<DownloadConfigurationBuilder> {
        let p = &mut self.prompter;
        let default_output = self.default_output.display().to_string();
        let output = p.ask(
            "Enter output directory (e.g., 'downloads')",
            Some(&default_output),
        )?;
        builder = builder.output_dir(expand_home(&output));

        let mut formats: Vec<String> = AudioFormat::NAMED.iter().map(|f| f.to_string()).collect();
        formats.push("Custom".to_string());
        let index = p.choose("Select audio format", &formats, 0)?;
        let format = match AudioFormat::NAMED.get(index) {
            Some(format) => format.clone(),
            None => {
                p.ask_parsed("Enter custom format (e.g., 'ogg')")?
            }
        };
        builder = builder.format(format);

        let mut bitrates: Vec<String> = Bitrate::PRESETS
            .iter()
            .map(|b| match b {
                Bitrate::Best => "best (0)".to_string(),
                other => other.to_string(),
            })
            .collect();
        bitrates.push("Custom".to_string());
        let index = p.choose("Select bitrate", &bitrates, 0)?;
        let bitrate = match Bitrate::PRESETS.get(index) {
            Some(bitrate) => bitrate.clone(),
            None => {
                p.ask_parsed("Enter custom bitrate (e.g., '192k') or a quality level (0-9)")?
            }
        };
        builder = builder.bitrate(bitrate);

        builder = builder
            .embed_lyrics(p.confirm("Embed lyrics?", true)?)
            .embed_metadata(p.confirm("Embed metadata (album art, track info, etc.)?", true)?)
            .sponsorblock(p.confirm("Enable SponsorBlock (requires YouTube sources)?", false)?);

        let policies: Vec<String> = OverwritePolicy::ALL
            .iter()
            .map(|policy| match policy {
                OverwritePolicy::Skip => "skip (keep existing files)".to_string(),
                OverwritePolicy::Force => "force (download again)".to_string(),
                OverwritePolicy::Metadata => "metadata (only update tags)".to_string(),
            })
            .collect();
        let index = p.choose("How should existing files be handled?", &policies, 0)?;
        builder = builder.overwrite(OverwritePolicy::ALL[index]);

        let threads = p.number(
            "Number of concurrent download threads",
            Some(spotwrap_core::config::DEFAULT_THREADS),
            1,
        )?;
        if let Some(threads) = threads {
            builder = builder.threads(threads);
        }
        Ok(builder)
    }

    fn download_options(
        &mut self,
        mut builder: DownloadConfigurationBuilder,
        targets: &TargetSet,
    ) -> io::Result<DownloadConfigurationBuilder> {
        let p = &mut self.prompter;
        if targets.has_collection() {
            let start = p.number(
                "Start index for playlist/album (leave empty for start)",
                None,
                1,
            )?;
            let end = p.number(
                "End index for playlist/album (leave empty for end)",
                None,
                start.unwrap_or(1),
            )?;
            builder = builder.playlist_range(start, end);
        }

        let archive = p.ask(
            "Path to archive file to skip already downloaded songs (e.g., 'archive.txt', leave empty for none)",
            Some(""),
        )?;
        if !archive.is_empty() {
            builder = builder.archive_file(Some(expand_home(&archive)));
        }

        if targets.len() == 1 {
            let query = p.ask(
                "Optional: Custom search query (e.g., 'artist - title', leave empty for none)",
                Some(""),
            )?;
            if !query.is_empty() {
                builder = builder.search_query(Some(query));
            }
        }
        Ok(builder)
    }

    fn extra_args(
        &mut self,
        builder: DownloadConfigurationBuilder,
    ) -> io::Result<DownloadConfigurationBuilder> {
        loop {
            let raw = self.prompter.ask(
                "Optional: Additional spotDL arguments (e.g., '--print-errors', leave empty for none)",
                Some(""),
            )?;
            match parse_extra_args(&raw) {
                Ok(args) => return Ok(builder.extra_args(args)),
                Err(e) => self.prompter.say(&format!("{e}. Please try again."))?,
            }
        }
    }
}

/// Expands a leading `~` to the home directory.
fn expand_home(input: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (input.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(input),
    }
}

fn print_banner() {
    println!("Welcome to the spotDL Downloader!");
    terminal::print_rule();
    println!("Initial Setup Checklist:");
    println!("1. Activate the Python environment spotDL is installed in, if you use one.");
    println!("2. Install spotDL: `pip install spotdl`");
    println!("3. Install FFmpeg if it is not installed system-wide: `spotdl --download-ffmpeg`");
    terminal::print_rule();
}

/// Runs one job in the session and prints its outcome.
fn run_job(
    session: &mut Session,
    job: MenuJob,
    interrupt: Option<&InterruptSlot>,
) -> CliResult<()> {
    let MenuJob {
        operation,
        config,
        targets,
    } = job;

    if matches!(operation, Operation::Download | Operation::Sync) {
        fs::create_dir_all(&config.output_dir).cli_with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                config.output_dir.display()
            )
        })?;
    }

    let spinner = terminal::start_spinner(format!("{operation} running"));
    start_armed(
        session,
        interrupt,
        operation,
        &config,
        &targets,
        ConsoleSink::new(Some(spinner), true),
    )?;
    let result = session
        .wait()
        .cli_context("spotDL invocation finished without a result")?;
    if let Some(slot) = interrupt {
        slot.disarm();
    }
    info!("{}", result.summary());

    terminal::print_result(&result);
    if operation == Operation::Sync && result.is_success() {
        if let Some(save_file) = &config.save_file {
            println!(
                "Note: For future syncs, you can use the command 'spotdl sync {}' directly.",
                with_state_extension(save_file).display()
            );
        }
    }
    Ok(())
}

/// Entry point for `spotwrap` without a subcommand and `spotwrap menu`.
pub fn run_menu(spotdl: &Path, interrupt: Option<&InterruptSlot>) -> CliResult<i32> {
    print_banner();
    let mut session = Session::checked(spotdl);
    if let Some(report) = session.readiness() {
        if !report.is_ready() {
            terminal::print_readiness(report);
        }
    }

    let stdin = io::stdin();
    let mut menu = Menu::new(stdin.lock(), io::stdout());
    menu.run_loop(|job| run_job(&mut session, job, interrupt))?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotwrap_core::{ValidationError, build_arguments};
    use std::io::Cursor;

    fn menu(input: &str) -> Menu<Cursor<Vec<u8>>, Vec<u8>> {
        Menu::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
            .with_default_output("music")
    }

    fn written(menu: Menu<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(menu.into_output()).unwrap()
    }

    #[test]
    fn test_download_with_defaults() {
        // targets, output, format, bitrate, lyrics, metadata, sponsorblock,
        // overwrite, threads, archive, search query, extra args
        let input = "https://open.spotify.com/track/abc\n\n\n\n\n\n\n\n\n\n\n\n";
        let mut m = menu(input);
        let job = m.collect_job(Operation::Download).unwrap().unwrap();

        let tokens = build_arguments(job.operation, &job.config, job.targets.as_slice()).unwrap();
        assert_eq!(
            tokens,
            vec![
                "download",
                "--output",
                "music",
                "--format",
                "mp3",
                "--bitrate",
                "0",
                "--threads",
                "4",
                "--skip-existing",
                "--lyrics",
                "--embed-metadata",
                "https://open.spotify.com/track/abc",
            ]
        );
    }

    #[test]
    fn test_download_playlist_with_custom_choices() {
        let input = [
            "https://open.spotify.com/playlist/p",
            "out",
            "7",   // custom format
            "ogg",
            "2",   // 320k
            "no",
            "yes",
            "yes",
            "3",   // metadata only
            "8",
            "2",   // playlist start
            "1",   // below start, asked again
            "5",
            "archive.txt",
            "",    // no search query
            "\"broken",
            "--print-errors",
        ]
        .join("\n")
            + "\n";
        let mut m = menu(&input);
        let job = m.collect_job(Operation::Download).unwrap().unwrap();
        let config = &job.config;

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.format, AudioFormat::Custom("ogg".into()));
        assert_eq!(config.bitrate, Bitrate::Kbps(320));
        assert!(!config.embed_lyrics && config.embed_metadata && config.sponsorblock);
        assert_eq!(config.overwrite, OverwritePolicy::Metadata);
        assert_eq!(config.threads, 8);
        assert_eq!((config.playlist_start, config.playlist_end), (Some(2), Some(5)));
        assert_eq!(config.archive_file, Some(PathBuf::from("archive.txt")));
        assert_eq!(config.search_query, None);
        assert_eq!(config.extra_args, vec!["--print-errors"]);

        let out = written(m);
        assert!(out.contains("greater than or equal to 2"));
    }

    #[test]
    fn test_blank_custom_format_and_bitrate_are_reasked() {
        let input = [
            "https://open.spotify.com/track/abc",
            "",
            "7",   // custom format
            "",
            "ogg",
            "7",   // custom bitrate
            "  ",
            "192k",
            "", "", "", "", "", "", "", "",
        ]
        .join("\n")
            + "\n";
        let mut m = menu(&input);
        let job = m.collect_job(Operation::Download).unwrap().unwrap();

        assert_eq!(job.config.format, AudioFormat::Custom("ogg".into()));
        assert_eq!(job.config.bitrate, Bitrate::Kbps(192));
        assert_eq!(written(m).matches("Invalid input:").count(), 2);
    }

    #[test]
    fn test_extra_args_reasked_until_parsed() {
        let input = "https://a https://b\n\"open\n--print-errors --ffmpeg-args '-vn'\n";
        let mut m = menu(input);
        let job = m.collect_job(Operation::GetUrls).unwrap().unwrap();

        assert_eq!(job.targets.len(), 2);
        assert_eq!(job.config.extra_args, vec!["--print-errors", "--ffmpeg-args", "-vn"]);
        assert!(written(m).contains("check the quoting"));
    }

    #[test]
    fn test_save_requires_file() {
        let input = "https://open.spotify.com/album/a\n\nmeta\n\n";
        let mut m = menu(input);
        let job = m.collect_job(Operation::SaveMetadata).unwrap().unwrap();

        assert_eq!(job.config.save_file, Some(PathBuf::from("meta")));
        let tokens = build_arguments(job.operation, &job.config, job.targets.as_slice()).unwrap();
        assert!(tokens.windows(2).any(|w| w == ["--save-file", "meta.spotdl"]));
        assert!(written(m).contains("A filename is required"));
    }

    #[test]
    fn test_sync_state_file_skips_save_prompt() {
        // source, then the common options with defaults, then extra args
        let input = "library.spotdl\n\n\n\n\n\n\n\n\n\n";
        let mut m = menu(input);
        let job = m.collect_job(Operation::Sync).unwrap().unwrap();

        assert!(job.targets.is_single_state_file());
        assert_eq!(job.config.save_file, None);
        assert!(!written(m).contains("save sync state"));
    }

    #[test]
    fn test_empty_targets_abort() {
        let mut m = menu("   \n");
        assert!(m.collect_job(Operation::GetUrls).unwrap().is_none());
        assert!(written(m).contains("No Spotify URLs provided"));
    }

    #[test]
    fn test_loop_runs_jobs_and_exits() {
        let input = "9\n4\nhttps://open.spotify.com/track/t\n\n5\n";
        let mut m = menu(input);
        let mut jobs = Vec::new();
        m.run_loop(|job| {
            jobs.push(job.operation);
            Ok(())
        })
        .unwrap();

        assert_eq!(jobs, vec![Operation::GetUrls]);
        let out = written(m);
        assert!(out.contains("Invalid choice. Please enter a number from the menu (1-5)."));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn test_loop_reports_validation_errors_and_continues() {
        let input = "4\nhttps://open.spotify.com/track/t\n\n";
        let mut m = menu(input);
        let mut calls = 0;
        m.run_loop(|_| {
            calls += 1;
            Err(ValidationError::EmptyTargets.into())
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert!(written(m).contains("Error: "));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("music"), PathBuf::from("music"));
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/music"), PathBuf::from(home).join("music"));
        }
    }
}
