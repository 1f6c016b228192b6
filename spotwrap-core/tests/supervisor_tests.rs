// Integration tests for the process supervisor against real child processes.
#![cfg(unix)]

mod common;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use common::{fake_tool, quick_options};
use spotwrap_core::{
    CancellationToken, ExecutionResult, ExitClassification, InvocationRequest, Operation,
    OutputLine, OutputSink, StreamKind, Supervisor,
};
use tempfile::tempdir;

#[derive(Default)]
struct Collector {
    lines: Vec<OutputLine>,
    finished: Vec<ExitClassification>,
}

impl OutputSink for Collector {
    fn on_line(&mut self, line: &OutputLine) {
        assert!(self.finished.is_empty(), "line delivered after completion");
        self.lines.push(line.clone());
    }

    fn on_finished(&mut self, result: &ExecutionResult) {
        self.finished.push(result.classification.clone());
    }
}

fn request(program: PathBuf, args: &[&str]) -> InvocationRequest {
    InvocationRequest::new(
        Operation::Download,
        program,
        args.iter().map(|a| a.to_string()).collect(),
    )
}

#[test]
fn test_lines_then_success() {
    let dir = tempdir().unwrap();
    let tool = fake_tool(
        dir.path(),
        "spotdl",
        "for i in 1 2 3 4 5; do echo \"line $i\"; done\nexit 0",
    );

    let mut sink = Collector::default();
    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &["download"]),
        &mut sink,
        &CancellationToken::new(),
    );

    assert_eq!(result.classification, ExitClassification::Success);
    assert_eq!(sink.lines.len(), 5);
    assert_eq!(sink.lines[0], OutputLine::stdout("line 1"));
    assert_eq!(sink.lines[4], OutputLine::stdout("line 5"));
    assert_eq!(sink.finished, vec![ExitClassification::Success]);
    assert_eq!(result.transcript, sink.lines);
}

#[test]
fn test_exit_code_is_reported() {
    let dir = tempdir().unwrap();
    let tool = fake_tool(
        dir.path(),
        "spotdl",
        "echo 'Processing query'\necho 'Something broke' >&2\nexit 7",
    );

    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &[]),
        &mut |_: &OutputLine| {},
        &CancellationToken::new(),
    );

    assert_eq!(result.classification, ExitClassification::NonZeroExit(7));
    assert_eq!(result.exit_code(), 7);
    assert_eq!(
        result.lines(StreamKind::Stdout).collect::<Vec<_>>(),
        vec!["Processing query"]
    );
    assert_eq!(
        result.lines(StreamKind::Stderr).collect::<Vec<_>>(),
        vec!["Something broke"]
    );
}

#[test]
fn test_arguments_reach_child_unsplit() {
    let dir = tempdir().unwrap();
    let tool = fake_tool(dir.path(), "spotdl", "for a in \"$@\"; do echo \"[$a]\"; done");

    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &["--output", "My Music; rm -rf /", "$HOME"]),
        &mut |_: &OutputLine| {},
        &CancellationToken::new(),
    );

    assert!(result.is_success());
    assert_eq!(
        result.lines(StreamKind::Stdout).collect::<Vec<_>>(),
        vec!["[--output]", "[My Music; rm -rf /]", "[$HOME]"]
    );
}

#[test]
fn test_cancel_stops_long_running_tool() {
    let dir = tempdir().unwrap();
    let tool = fake_tool(dir.path(), "spotdl", "echo started\nwhile true; do sleep 1; done");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.cancel();
    });

    let started = Instant::now();
    let mut sink = Collector::default();
    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &[]),
        &mut sink,
        &cancel,
    );

    assert_eq!(result.classification, ExitClassification::Cancelled);
    assert_eq!(result.exit_code(), 130);
    assert_eq!(sink.lines, vec![OutputLine::stdout("started")]);
    // Termination plus grace period plus drain, with slack for slow machines
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_cancel_escalates_when_term_is_ignored() {
    let dir = tempdir().unwrap();
    let tool = fake_tool(
        dir.path(),
        "spotdl",
        "trap '' TERM\necho stubborn\nwhile true; do sleep 1; done",
    );

    // Cancel only once the trap is installed
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut sink = move |line: &OutputLine| {
        if line.text == "stubborn" {
            trigger.cancel();
        }
    };

    let started = Instant::now();
    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &[]),
        &mut sink,
        &cancel,
    );

    assert_eq!(result.classification, ExitClassification::Cancelled);
    assert!(started.elapsed() >= quick_options().grace_period);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_missing_executable_is_spawn_failure() {
    let dir = tempdir().unwrap();
    let mut sink = Collector::default();
    let result = Supervisor::new().with_options(quick_options()).run(
        &request(dir.path().join("no-such-spotdl"), &["download"]),
        &mut sink,
        &CancellationToken::new(),
    );

    assert!(matches!(result.classification, ExitClassification::SpawnFailure(_)));
    assert_eq!(result.exit_code(), 127);
    assert!(sink.lines.is_empty());
    assert_eq!(sink.finished.len(), 1);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let dir = tempdir().unwrap();
    let tool = fake_tool(dir.path(), "spotdl", "printf 'caf\\303\\251 \\377\\r\\n'");

    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &[]),
        &mut |_: &OutputLine| {},
        &CancellationToken::new(),
    );

    assert_eq!(result.transcript, vec![OutputLine::stdout("café \u{fffd}")]);
}

#[test]
fn test_background_pipe_holder_does_not_block() {
    let dir = tempdir().unwrap();
    // The grandchild inherits stdout and outlives the tool
    let tool = fake_tool(dir.path(), "spotdl", "echo done\n(sleep 30) &\nexit 0");

    let started = Instant::now();
    let result = Supervisor::new().with_options(quick_options()).run(
        &request(tool, &[]),
        &mut |_: &OutputLine| {},
        &CancellationToken::new(),
    );

    assert!(result.is_success());
    assert_eq!(result.transcript, vec![OutputLine::stdout("done")]);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_working_directory() {
    let dir = tempdir().unwrap();
    let work = tempdir().unwrap();
    let tool = fake_tool(dir.path(), "spotdl", "pwd");

    let mut req = request(tool, &[]);
    req.working_dir = Some(work.path().to_path_buf());
    let result = Supervisor::new().with_options(quick_options()).run(
        &req,
        &mut |_: &OutputLine| {},
        &CancellationToken::new(),
    );

    let printed = PathBuf::from(result.transcript[0].text.clone());
    assert_eq!(
        printed.canonicalize().unwrap(),
        work.path().canonicalize().unwrap()
    );
}
