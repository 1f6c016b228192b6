//! Terminal UI components and styling for spotwrap.
//!
//! Sections, status lines, spotDL output echo, the run spinner and the final
//! summary block. Colour is decided once at start-up from `--no-color`,
//! `NO_COLOR` and what the terminal supports.

use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use spotwrap_core::{
    ExecutionResult, ExitClassification, OutputLine, OutputSink, ReadinessReport, StreamKind,
    ToolStatus,
};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::logging::TRANSCRIPT_TARGET;

static USE_COLOR: AtomicBool = AtomicBool::new(false);

/// Decides once whether output is coloured.
pub fn init_color(no_color_flag: bool) -> bool {
    let enabled = !no_color_flag
        && std::env::var_os("NO_COLOR").is_none()
        && supports_color::on(supports_color::Stream::Stdout).is_some();
    USE_COLOR.store(enabled, Ordering::Relaxed);
    enabled
}

fn should_use_color() -> bool {
    USE_COLOR.load(Ordering::Relaxed)
}

/// Width for separator lines, capped so wide terminals stay readable.
fn rule_width() -> usize {
    let (_, cols) = Term::stdout().size();
    (cols as usize).clamp(20, 60)
}

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    println!();
    if should_use_color() {
        println!("===== {} =====", title.to_uppercase().cyan());
    } else {
        println!("===== {} =====", title.to_uppercase());
    }
}

pub fn print_rule() {
    let rule = "-".repeat(rule_width());
    if should_use_color() {
        println!("{}", rule.dimmed());
    } else {
        println!("{rule}");
    }
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str) {
    let padding = 12usize.saturating_sub(label.chars().count()).max(1);
    if should_use_color() {
        println!("  {}:{}{}", label, " ".repeat(padding), value.bold());
    } else {
        println!("  {}:{}{}", label, " ".repeat(padding), value);
    }
}

pub fn print_success(message: &str) {
    if should_use_color() {
        println!("✓ {}", message.green());
    } else {
        println!("✓ {message}");
    }
}

pub fn print_warning(message: &str) {
    if should_use_color() {
        println!("⚠ {}", message.yellow());
    } else {
        println!("⚠ {message}");
    }
}

/// Print an error message with an optional suggestion, to stderr
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        eprintln!("✗ {}", title.red().bold());
    } else {
        eprintln!("✗ {title}");
    }
    eprintln!("  {message}");
    if let Some(suggestion) = suggestion {
        eprintln!("  Suggestion: {suggestion}");
    }
}

/// Echo one line of spotDL output.
pub fn print_output_line(line: &OutputLine) {
    match line.stream {
        StreamKind::Stdout => println!("{}", line.text),
        StreamKind::Stderr if should_use_color() => eprintln!("{}", line.text.yellow()),
        StreamKind::Stderr => eprintln!("{}", line.text),
    }
}

/// Shows the readiness report with install hints.
pub fn print_readiness(report: &ReadinessReport) {
    print_section("Dependencies");
    print_status("spotDL", &report.spotdl.to_string());
    print_status("FFmpeg", &report.ffmpeg.to_string());
    if report.spotdl.is_available() && report.ffmpeg.is_available() {
        println!();
        print_success("spotDL and FFmpeg are ready");
        return;
    }
    println!();
    for problem in report.problems() {
        print_warning(&problem);
    }
    if matches!(report.ffmpeg, ToolStatus::Missing) && report.spotdl.is_available() {
        println!("  Downloads will fail until FFmpeg is installed.");
    }
}

/// Prints the outcome block shown after every invocation.
pub fn print_result(result: &ExecutionResult) {
    let failures = result.failures();
    if !failures.is_empty() {
        print_section("Skipped/Failed Downloads");
        for song in failures.iter() {
            println!("- {song}");
        }
    }

    println!();
    let summary = result.summary();
    match &result.classification {
        ExitClassification::Success if failures.is_empty() => print_success(&summary),
        ExitClassification::Success | ExitClassification::Cancelled => print_warning(&summary),
        ExitClassification::NonZeroExit(_) => {
            print_error(&summary, &format!("Command: {}", result.command.join(" ")), None)
        }
        ExitClassification::SpawnFailure(_) => print_error(
            &summary,
            &format!("Tried to run: {}", result.command.first().map_or("", String::as_str)),
            Some("Install spotDL with 'pip install spotdl' or pass --spotdl PATH"),
        ),
    }
    print_status("Duration", &format!("{:.1?}", result.duration));
}

/// Spinner with elapsed time, hidden when stderr is not a terminal.
pub fn start_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message);
    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Sink used by both front-ends: echoes lines above the spinner and records
/// them in the log file.
pub struct ConsoleSink {
    spinner: Option<ProgressBar>,
    echo: bool,
}

impl ConsoleSink {
    pub fn new(spinner: Option<ProgressBar>, echo: bool) -> Self {
        Self { spinner, echo }
    }
}

impl OutputSink for ConsoleSink {
    fn on_line(&mut self, line: &OutputLine) {
        log::info!(target: TRANSCRIPT_TARGET, "[{}] {}", line.stream, line.text);
        if !self.echo {
            return;
        }
        match &self.spinner {
            Some(pb) => pb.suspend(|| print_output_line(line)),
            None => print_output_line(line),
        }
    }

    fn on_finished(&mut self, result: &ExecutionResult) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        log::info!(
            target: TRANSCRIPT_TARGET,
            "{} ({})",
            result.summary(),
            result.classification
        );
    }
}
