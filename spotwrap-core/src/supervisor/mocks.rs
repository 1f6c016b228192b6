// spotwrap-core/src/supervisor/mocks.rs

// --- Scripted processes for supervisor tests ---

use super::process::{SpawnRequest, ToolProcess, ToolSpawner};
use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Which stop requests a scripted process has received.
#[derive(Debug, Clone, Default)]
pub struct SignalLog {
    terminated: Arc<AtomicBool>,
    killed: Arc<AtomicBool>,
}

impl SignalLog {
    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

/// A process that replays fixed output and exits as scripted.
#[derive(Debug)]
pub struct ScriptedProcess {
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
    /// `None` keeps the process running until it is stopped.
    exit_code: Option<i32>,
    terminate_exit: Option<i32>,
    signals: SignalLog,
}

impl ScriptedProcess {
    pub fn exiting(code: i32) -> Self {
        Self {
            stdout: Some(Vec::new()),
            stderr: Some(Vec::new()),
            exit_code: Some(code),
            terminate_exit: None,
            signals: SignalLog::default(),
        }
    }

    /// Runs until killed and ignores graceful termination.
    pub fn running() -> Self {
        Self {
            exit_code: None,
            ..Self::exiting(0)
        }
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.stdout = Some(text.as_bytes().to_vec());
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.stderr = Some(text.as_bytes().to_vec());
        self
    }

    pub fn exits_on_terminate(mut self, code: i32) -> Self {
        self.terminate_exit = Some(code);
        self
    }

    pub fn signals(&self) -> SignalLog {
        self.signals.clone()
    }
}

impl ToolProcess for ScriptedProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stdout
            .take()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stderr
            .take()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        if self.signals.killed() {
            return Ok(Some(137));
        }
        if self.signals.terminated() {
            if let Some(code) = self.terminate_exit {
                return Ok(Some(code));
            }
        }
        Ok(self.exit_code)
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.signals.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn kill(&mut self) -> io::Result<()> {
        self.signals.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
enum Expectation {
    Process(ScriptedProcess),
    SpawnError(io::ErrorKind),
}

/// Hands out scripted processes in the order they were pushed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSpawner {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, process: ScriptedProcess) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Process(process));
    }

    pub fn push_spawn_error(&self, kind: io::ErrorKind) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::SpawnError(kind));
    }

    pub fn received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.lock().unwrap().clone()
    }
}

impl ToolSpawner for ScriptedSpawner {
    type Process = ScriptedProcess;

    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Self::Process> {
        self.received_calls.lock().unwrap().push(request.args.to_vec());
        match self.expectations.lock().unwrap().pop_front() {
            Some(Expectation::Process(process)) => Ok(process),
            Some(Expectation::SpawnError(kind)) => Err(io::Error::from(kind)),
            None => panic!("ScriptedSpawner: no process scripted for {:?}", request.args),
        }
    }
}
