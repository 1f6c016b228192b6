//! Implementation of the one-shot subcommands (`download`, `save`, `sync`,
//! `url`).
//!
//! Flags are turned into a configuration, the spotDL command line is built
//! (and printed for `--dry-run`), then spotDL runs in a session with its
//! output echoed above a spinner. The exit status mirrors the outcome.

use std::fs;
use std::path::Path;

use log::{debug, info};
use spotwrap_core::{
    CancellationToken, DownloadConfiguration, DownloadConfigurationBuilder, InvocationRequest,
    Operation, OutputSink, Session, TargetSet,
};

use super::parse_extra_args;
use crate::cli::OperationArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::interrupt::InterruptSlot;
use crate::terminal::{self, ConsoleSink};

/// Settings shared by every one-shot subcommand.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub spotdl: &'a Path,
    pub json: bool,
    pub interrupt: Option<&'a InterruptSlot>,
}

/// Starts `operation` with its cancel token already armed in `interrupt`, so
/// a Ctrl-C that lands while spotDL is being spawned still reaches it. The
/// slot is disarmed again if the session refuses to start.
pub fn start_armed<K>(
    session: &mut Session,
    interrupt: Option<&InterruptSlot>,
    operation: Operation,
    config: &DownloadConfiguration,
    targets: &TargetSet,
    sink: K,
) -> CliResult<()>
where
    K: OutputSink + Send + 'static,
{
    let token = CancellationToken::new();
    if let Some(slot) = interrupt {
        slot.arm(token.clone());
    }
    let started = session.start_with_token(operation, config, targets, sink, token);
    if started.is_err() {
        if let Some(slot) = interrupt {
            slot.disarm();
        }
    }
    started
}

/// Turns parsed flags into a validated configuration and target set.
pub fn build_configuration(
    args: &OperationArgs,
) -> CliResult<(DownloadConfiguration, TargetSet)> {
    let extra_args = match args.extra_args.as_deref() {
        Some(raw) => parse_extra_args(raw)?,
        None => Vec::new(),
    };

    let config = DownloadConfigurationBuilder::new()
        .output_dir(args.output.clone())
        .format(args.format.clone())
        .bitrate(args.bitrate.clone())
        .threads(args.threads)
        .overwrite(args.overwrite)
        .embed_lyrics(!args.no_lyrics)
        .embed_metadata(!args.no_metadata)
        .sponsorblock(args.sponsor_block)
        .archive_file(args.archive.clone())
        .save_file(args.save_file.clone())
        .search_query(args.search_query.clone())
        .playlist_range(args.playlist_start, args.playlist_end)
        .extra_args(extra_args)
        .working_dir(args.working_dir.clone())
        .build()?;

    let targets = TargetSet::new(args.targets.iter().cloned())?;
    Ok((config, targets))
}

/// Command line as a user could paste it into a POSIX shell.
pub fn shell_line(command: &[String]) -> String {
    shlex::try_join(command.iter().map(String::as_str)).unwrap_or_else(|_| command.join(" "))
}

/// Runs one operation and returns the process exit status.
pub fn run_operation(
    ctx: RunContext<'_>,
    operation: Operation,
    args: &OperationArgs,
) -> CliResult<i32> {
    let (config, targets) = build_configuration(args)?;
    let request =
        InvocationRequest::from_configuration(operation, ctx.spotdl, &config, targets.as_slice())?;

    if args.dry_run {
        let command = request.command_line();
        if ctx.json {
            let text = serde_json::to_string_pretty(&command)
                .map_err(|e| crate::cli_error!("Failed to serialize command: {e}"))?;
            println!("{text}");
        } else {
            println!("{}", shell_line(&command));
        }
        return Ok(0);
    }

    if operation.uses_encoding() {
        fs::create_dir_all(&config.output_dir).cli_with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                config.output_dir.display()
            )
        })?;
    }
    info!("Command: {}", shell_line(&request.command_line()));

    if !ctx.json {
        terminal::print_section(operation.display_name());
        terminal::print_status("Targets", &targets.len().to_string());
        terminal::print_status("Output", &config.output_dir.display().to_string());
        terminal::print_rule();
    }

    let spinner = (!ctx.json).then(|| terminal::start_spinner(format!("{operation} running")));
    let sink = ConsoleSink::new(spinner, !ctx.json);

    let mut session = Session::new(ctx.spotdl);
    start_armed(&mut session, ctx.interrupt, operation, &config, &targets, sink)?;

    let result = session
        .wait()
        .cli_context("spotDL invocation finished without a result")?;
    if let Some(slot) = ctx.interrupt {
        slot.disarm();
    }
    debug!("{} finished: {}", operation, result.classification);

    if ctx.json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| crate::cli_error!("Failed to serialize result: {e}"))?;
        println!("{text}");
    } else {
        terminal::print_rule();
        terminal::print_result(&result);
        if operation == Operation::Sync {
            if let Some(save_file) = config.save_file.as_ref().filter(|_| result.is_success()) {
                println!(
                    "  For future syncs you can run: spotdl sync {}",
                    spotwrap_core::with_state_extension(save_file).display()
                );
            }
        }
    }

    Ok(result.exit_code())
}
