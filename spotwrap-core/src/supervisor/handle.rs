//! Background invocations: cancellation token and completion handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::error;

use super::{InvocationRequest, OutputSink, Supervisor, ToolSpawner};
use crate::operation::Operation;
use crate::result::{ExecutionResult, ExitClassification};

/// Shared flag asking a running invocation to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An invocation running on its own thread.
///
/// The result is handed out once, by whichever of [`try_result`],
/// [`wait_timeout`] or [`wait`] observes it first.
///
/// [`try_result`]: InvocationHandle::try_result
/// [`wait_timeout`]: InvocationHandle::wait_timeout
/// [`wait`]: InvocationHandle::wait
#[derive(Debug)]
pub struct InvocationHandle {
    operation: Operation,
    command: Vec<String>,
    token: CancellationToken,
    result_rx: Receiver<ExecutionResult>,
    worker: Option<JoinHandle<()>>,
}

impl InvocationHandle {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Requests cancellation. Returns immediately; the outcome arrives
    /// through the result as [`ExitClassification::Cancelled`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the worker thread has finished.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Returns the result if the invocation has completed.
    pub fn try_result(&mut self) -> Option<ExecutionResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.join_worker();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.lost_result()),
        }
    }

    /// Waits up to `timeout` for the result.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<ExecutionResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.join_worker();
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.lost_result()),
        }
    }

    /// Blocks until the invocation completes.
    pub fn wait(mut self) -> ExecutionResult {
        match self.result_rx.recv() {
            Ok(result) => {
                self.join_worker();
                result
            }
            Err(_) => self.lost_result(),
        }
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Invocation worker for {} panicked", self.operation);
            }
        }
    }

    /// Result reported when the worker died without sending one.
    fn lost_result(&mut self) -> ExecutionResult {
        self.join_worker();
        ExecutionResult {
            operation: self.operation,
            classification: ExitClassification::SpawnFailure(
                "invocation worker stopped without reporting a result".to_string(),
            ),
            transcript: Vec::new(),
            duration: Duration::ZERO,
            command: self.command.clone(),
        }
    }
}

pub(super) fn spawn_invocation<S, K>(
    supervisor: Supervisor<S>,
    request: InvocationRequest,
    mut sink: K,
    token: CancellationToken,
) -> InvocationHandle
where
    S: ToolSpawner,
    K: OutputSink + Send + 'static,
{
    let (tx, result_rx) = mpsc::channel();
    let operation = request.operation;
    let command = request.command_line();

    let worker_token = token.clone();
    let worker = thread::spawn(move || {
        let result = supervisor.run(&request, &mut sink, &worker_token);
        // The handle may already be gone; the sink has seen the result
        let _ = tx.send(result);
    });

    InvocationHandle {
        operation,
        command,
        token,
        result_rx,
        worker: Some(worker),
    }
}
