// ============================================================================
// spotwrap-core/src/session.rs
// ============================================================================
//
// SESSION: Caller-Owned Context for the Front-Ends
//
// A Session keeps the spotDL path, the readiness report taken at start-up
// and at most one active invocation. Both front-ends drive their operations
// through it, which is where the one-invocation-at-a-time rule lives.
//
// KEY COMPONENTS:
// - Session::start: validate, build the command line, launch in background
// - Session::poll / wait / wait_timeout: collect the terminal result and
//   free the slot
// - Session::cancel: forward a cancel request to the active invocation

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---- External crate imports ----
use log::debug;

// ---- Internal crate imports ----
use crate::config::DownloadConfiguration;
use crate::error::{CoreError, CoreResult};
use crate::operation::{Operation, TargetSet};
use crate::readiness::{ReadinessReport, check_readiness};
use crate::result::ExecutionResult;
use crate::supervisor::{
    CancellationToken, InvocationHandle, InvocationRequest, OutputSink, Supervisor, SystemSpawner,
    ToolSpawner,
};

pub struct Session<S: ToolSpawner + Clone = SystemSpawner> {
    spotdl: PathBuf,
    readiness: Option<ReadinessReport>,
    supervisor: Supervisor<S>,
    active: Option<InvocationHandle>,
    finished: Option<ExecutionResult>,
}

impl Session<SystemSpawner> {
    /// Creates a session without probing the tools.
    pub fn new(spotdl: impl Into<PathBuf>) -> Self {
        Self::with_supervisor(spotdl, Supervisor::new())
    }

    /// Creates a session and checks spotDL and FFmpeg once.
    pub fn checked(spotdl: impl Into<PathBuf>) -> Self {
        let mut session = Self::new(spotdl);
        session.refresh_readiness();
        session
    }
}

impl<S: ToolSpawner + Clone> Session<S> {
    pub fn with_supervisor(spotdl: impl Into<PathBuf>, supervisor: Supervisor<S>) -> Self {
        Self {
            spotdl: spotdl.into(),
            readiness: None,
            supervisor,
            active: None,
            finished: None,
        }
    }

    pub fn spotdl_path(&self) -> &Path {
        &self.spotdl
    }

    /// The last readiness report, if a check has run.
    pub fn readiness(&self) -> Option<&ReadinessReport> {
        self.readiness.as_ref()
    }

    /// Re-runs the readiness check and keeps the new report.
    pub fn refresh_readiness(&mut self) -> &ReadinessReport {
        self.readiness.insert(check_readiness(&self.spotdl))
    }

    /// Builds the command line for `operation` and starts it in the
    /// background.
    ///
    /// Fails with `InvocationActive` while a previous invocation is running
    /// and with `Validation` when the inputs are rejected; nothing is spawned
    /// in either case.
    pub fn start<K>(
        &mut self,
        operation: Operation,
        config: &DownloadConfiguration,
        targets: &TargetSet,
        sink: K,
    ) -> CoreResult<()>
    where
        K: OutputSink + Send + 'static,
    {
        self.start_with_token(operation, config, targets, sink, CancellationToken::new())
    }

    /// Same as [`start`](Session::start), with a token the caller created
    /// beforehand, so an interrupt handler can hold it before spotDL exists.
    pub fn start_with_token<K>(
        &mut self,
        operation: Operation,
        config: &DownloadConfiguration,
        targets: &TargetSet,
        sink: K,
        token: CancellationToken,
    ) -> CoreResult<()>
    where
        K: OutputSink + Send + 'static,
    {
        self.reap();
        if self.active.is_some() {
            return Err(CoreError::InvocationActive);
        }

        let request = InvocationRequest::from_configuration(
            operation,
            self.spotdl.clone(),
            config,
            targets.as_slice(),
        )?;
        debug!("Session starting {}", operation);
        self.finished = None;
        self.active = Some(self.supervisor.spawn_with_token(request, sink, token));
        Ok(())
    }

    /// True while an invocation is running.
    pub fn is_busy(&mut self) -> bool {
        self.reap();
        self.active.is_some()
    }

    /// Requests cancellation of the active invocation. Returns false when
    /// nothing is running.
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns the result of a completed invocation without blocking.
    pub fn poll(&mut self) -> Option<ExecutionResult> {
        self.reap();
        self.finished.take()
    }

    /// Waits up to `timeout` for the active invocation.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<ExecutionResult> {
        if let Some(result) = self.finished.take() {
            return Some(result);
        }
        let result = self.active.as_mut()?.wait_timeout(timeout)?;
        self.active = None;
        Some(result)
    }

    /// Blocks until the active invocation completes.
    pub fn wait(&mut self) -> Option<ExecutionResult> {
        if let Some(result) = self.finished.take() {
            return Some(result);
        }
        self.active.take().map(InvocationHandle::wait)
    }

    /// Moves a completed invocation's result out of the active slot.
    fn reap(&mut self) {
        if let Some(handle) = self.active.as_mut() {
            if let Some(result) = handle.try_result() {
                debug!(
                    "Session released slot: {} {}",
                    handle.operation(),
                    result.classification
                );
                self.finished = Some(result);
                self.active = None;
            }
        }
    }
}
