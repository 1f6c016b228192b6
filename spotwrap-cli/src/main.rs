// spotwrap-cli/src/main.rs
//
// Entry point for the `spotwrap` binary.
//
// Responsibilities:
// - Parsing command-line arguments (definitions live in cli.rs).
// - Setting up colour, console logging and the optional log file.
// - Installing the Ctrl-C handler that cancels a running spotDL.
// - Dispatching to the menu, the readiness check or a one-shot operation.
// - Mapping the outcome to the process exit code.

use clap::Parser;
use log::{debug, warn};
use owo_colors::OwoColorize;
use spotwrap_cli::logging::{console_level, init_logging};
use spotwrap_cli::{
    Cli, CliResult, Commands, InterruptSlot, RunContext, error_exit_code, run_check, run_menu,
    run_operation, terminal,
};
use std::process;

fn main() {
    let cli = Cli::parse();

    let use_color = terminal::init_color(cli.no_color);
    let command_name = cli.command.as_ref().map_or("menu", Commands::name);
    let log_path = match init_logging(
        console_level(cli.verbose),
        use_color,
        cli.log_dir.as_deref(),
        command_name,
    ) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(error_exit_code(&e));
        }
    };
    if let Some(path) = &log_path {
        debug!("Writing log file to {}", path.display());
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            if use_color {
                eprintln!("{} {}", "Error:".red().bold(), e.red());
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    };
    log::logger().flush();
    process::exit(code);
}

fn run(cli: &Cli) -> CliResult<i32> {
    let interrupt = match InterruptSlot::install() {
        Ok(slot) => Some(slot),
        Err(e) => {
            warn!("{e}; Ctrl-C will stop spotwrap without cancelling spotDL cleanly");
            None
        }
    };

    let Some(command) = &cli.command else {
        return run_menu(&cli.spotdl, interrupt.as_ref());
    };
    if let Some((operation, args)) = command.operation() {
        let ctx = RunContext {
            spotdl: &cli.spotdl,
            json: cli.json,
            interrupt: interrupt.as_ref(),
        };
        return run_operation(ctx, operation, args);
    }
    match command {
        Commands::Check => run_check(&cli.spotdl, cli.json),
        _ => run_menu(&cli.spotdl, interrupt.as_ref()),
    }
}
