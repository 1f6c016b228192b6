// ============================================================================
// spotwrap-core/src/supervisor/mod.rs
// ============================================================================
//
// PROCESS SUPERVISOR: Running spotDL and Streaming its Output
//
// The supervisor launches one spotDL child per request, reads stdout and
// stderr concurrently on reader threads, forwards every line to an
// OutputSink as it arrives, honours cancellation, and returns an
// ExecutionResult once the child has exited and its output has been drained.
//
// KEY COMPONENTS:
// - InvocationRequest: operation, program path, argument vector
// - OutputSink: per-line callback plus a completion callback
// - Supervisor: the blocking run loop, generic over the process spawner
// - InvocationHandle: background invocation with cancel and wait
//
// CANCELLATION:
// A cancel request sends a graceful termination to the child's process
// group. If the child is still alive after the grace period it is killed.
// The result is then classified as Cancelled regardless of exit code.

// ---- Standard library imports ----
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ---- External crate imports ----
use log::{debug, error, info, warn};

// ---- Internal crate imports ----
use crate::command::build_arguments;
use crate::config::DownloadConfiguration;
use crate::error::ValidationError;
use crate::operation::Operation;
use crate::result::{ExecutionResult, ExitClassification, OutputLine, StreamKind};

// ============================================================================
// SUBMODULES
// ============================================================================

mod handle;
pub mod process;

#[cfg(test)]
pub(crate) mod mocks;

pub use handle::{CancellationToken, InvocationHandle};
pub use process::{SpawnRequest, SystemProcess, SystemSpawner, ToolProcess, ToolSpawner};

// ============================================================================
// REQUEST AND SINK
// ============================================================================

/// A fully built spotDL command line ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub operation: Operation,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl InvocationRequest {
    pub fn new(operation: Operation, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            operation,
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Builds the argument vector for `operation` and wraps it in a request.
    pub fn from_configuration<S: AsRef<str>>(
        operation: Operation,
        program: impl Into<PathBuf>,
        config: &DownloadConfiguration,
        targets: &[S],
    ) -> Result<Self, ValidationError> {
        let args = build_arguments(operation, config, targets)?;
        Ok(Self {
            operation,
            program: program.into(),
            args,
            working_dir: config.working_dir.clone(),
        })
    }

    /// Program followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Receives output while an invocation runs.
///
/// `on_line` is called once per line, in arrival order, from the thread that
/// drives the invocation. `on_finished` is called exactly once at the end,
/// including for spawn failures where no line was ever delivered.
pub trait OutputSink {
    fn on_line(&mut self, line: &OutputLine);

    fn on_finished(&mut self, _result: &ExecutionResult) {}
}

impl<F> OutputSink for F
where
    F: FnMut(&OutputLine),
{
    fn on_line(&mut self, line: &OutputLine) {
        self(line)
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn on_line(&mut self, _line: &OutputLine) {}
}

// ============================================================================
// SUPERVISOR
// ============================================================================

/// Timing knobs for the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Time between graceful termination and a forced kill.
    pub grace_period: Duration,
    /// How often the child and the cancel flag are checked while idle.
    pub poll_interval: Duration,
    /// Upper bound on reading leftover output after the child exits.
    pub drain_timeout: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
            drain_timeout: Duration::from_secs(2),
        }
    }
}

/// Runs spotDL invocations.
#[derive(Debug, Clone, Default)]
pub struct Supervisor<S: ToolSpawner = SystemSpawner> {
    spawner: S,
    options: SupervisorOptions,
}

impl Supervisor<SystemSpawner> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: ToolSpawner> Supervisor<S> {
    pub fn with_spawner(spawner: S) -> Self {
        Self {
            spawner,
            options: SupervisorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SupervisorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    /// Runs one invocation to completion on the calling thread.
    ///
    /// Never panics and never returns early: every outcome, including a
    /// missing executable, is reported through the returned classification.
    pub fn run(
        &self,
        request: &InvocationRequest,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let command = request.command_line();
        info!("Starting {}: {}", request.operation, command.join(" "));

        let spawn_request = SpawnRequest {
            program: &request.program,
            args: &request.args,
            working_dir: request.working_dir.as_deref(),
        };

        let mut process = match self.spawner.spawn(&spawn_request) {
            Ok(process) => process,
            Err(e) => {
                let reason = describe_spawn_error(&request.program, &e);
                error!("{}", reason);
                let result = ExecutionResult {
                    operation: request.operation,
                    classification: ExitClassification::SpawnFailure(reason),
                    transcript: Vec::new(),
                    duration: started.elapsed(),
                    command,
                };
                sink.on_finished(&result);
                return result;
            }
        };

        match process.id() {
            Some(pid) => debug!("{} running with pid {}", request.program.display(), pid),
            None => debug!("{} running", request.program.display()),
        }

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(pipe) = process.take_stdout() {
            readers.push(spawn_reader(pipe, StreamKind::Stdout, tx.clone()));
        }
        if let Some(pipe) = process.take_stderr() {
            readers.push(spawn_reader(pipe, StreamKind::Stderr, tx.clone()));
        }
        drop(tx);

        let mut transcript = Vec::new();
        let mut pipes_open = true;
        let mut terminated_at: Option<Instant> = None;
        let mut killed = false;

        let exit_code = loop {
            if pipes_open {
                match rx.recv_timeout(self.options.poll_interval) {
                    Ok(line) => {
                        deliver(line, sink, &mut transcript);
                        while let Ok(line) = rx.try_recv() {
                            deliver(line, sink, &mut transcript);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => pipes_open = false,
                }
            } else {
                thread::sleep(self.options.poll_interval);
            }

            match process.try_wait() {
                Ok(Some(code)) => break code,
                Ok(None) => {}
                Err(e) => {
                    error!("Lost track of spotDL process: {}", e);
                    if let Err(e) = process.kill() {
                        warn!("Failed to kill spotDL process: {}", e);
                    }
                    break -1;
                }
            }

            if terminated_at.is_none() && cancel.is_cancelled() {
                info!("Cancelling {}", request.operation);
                if let Err(e) = process.terminate() {
                    warn!("Failed to terminate spotDL process: {}", e);
                }
                terminated_at = Some(Instant::now());
            }

            if let Some(since) = terminated_at {
                if !killed && since.elapsed() >= self.options.grace_period {
                    warn!(
                        "spotDL did not exit within {:?} of termination; killing it",
                        self.options.grace_period
                    );
                    if let Err(e) = process.kill() {
                        warn!("Failed to kill spotDL process: {}", e);
                    }
                    killed = true;
                }
            }
        };

        if pipes_open {
            drain(&rx, self.options.drain_timeout, sink, &mut transcript, readers);
        } else {
            join_readers(readers);
        }

        let classification = if terminated_at.is_some() {
            ExitClassification::Cancelled
        } else if exit_code == 0 {
            ExitClassification::Success
        } else {
            ExitClassification::NonZeroExit(exit_code)
        };

        let result = ExecutionResult {
            operation: request.operation,
            classification,
            transcript,
            duration: started.elapsed(),
            command,
        };
        info!("{} {} in {:.1?}", request.operation, result.classification, result.duration);
        sink.on_finished(&result);
        result
    }

    /// Runs one invocation on a background thread.
    pub fn spawn<K>(&self, request: InvocationRequest, sink: K) -> InvocationHandle
    where
        S: Clone,
        K: OutputSink + Send + 'static,
    {
        self.spawn_with_token(request, sink, CancellationToken::new())
    }

    /// Like [`spawn`](Supervisor::spawn), but cancelled through a token the
    /// caller already holds. A token cancelled before the child starts stops
    /// it as soon as it is running.
    pub fn spawn_with_token<K>(
        &self,
        request: InvocationRequest,
        sink: K,
        token: CancellationToken,
    ) -> InvocationHandle
    where
        S: Clone,
        K: OutputSink + Send + 'static,
    {
        handle::spawn_invocation(self.clone(), request, sink, token)
    }
}

/// Runs one invocation with the system spawner and default options.
pub fn run(
    request: &InvocationRequest,
    sink: &mut dyn OutputSink,
    cancel: &CancellationToken,
) -> ExecutionResult {
    Supervisor::new().run(request, sink, cancel)
}

// ============================================================================
// HELPERS
// ============================================================================

fn deliver(line: OutputLine, sink: &mut dyn OutputSink, transcript: &mut Vec<OutputLine>) {
    sink.on_line(&line);
    transcript.push(line);
}

/// Reads leftover output after exit. A grandchild holding the pipes open
/// must not block completion, so reading stops at the deadline.
fn drain(
    rx: &Receiver<OutputLine>,
    timeout: Duration,
    sink: &mut dyn OutputSink,
    transcript: &mut Vec<OutputLine>,
    readers: Vec<JoinHandle<()>>,
) {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => deliver(line, sink, transcript),
            Err(RecvTimeoutError::Disconnected) => {
                join_readers(readers);
                return;
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("Output pipes still open {:?} after exit; not waiting further", timeout);
                return;
            }
        }
    }
}

fn join_readers(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        if reader.join().is_err() {
            warn!("Output reader thread panicked");
        }
    }
}

fn spawn_reader(
    pipe: Box<dyn Read + Send>,
    stream: StreamKind,
    tx: Sender<OutputLine>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = OutputLine::new(stream, decode_line(&buf));
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Stopped reading {}: {}", stream, e);
                    break;
                }
            }
        }
    })
}

/// Strips the line terminator and replaces invalid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

fn describe_spawn_error(program: &Path, error: &std::io::Error) -> String {
    match error.kind() {
        std::io::ErrorKind::NotFound => format!(
            "'{}' was not found. Install spotDL (pip install spotdl) or point to its executable",
            program.display()
        ),
        std::io::ErrorKind::PermissionDenied => {
            format!("'{}' is not executable: {}", program.display(), error)
        }
        _ => format!("failed to start '{}': {}", program.display(), error),
    }
}
