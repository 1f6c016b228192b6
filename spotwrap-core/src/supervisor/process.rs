// ============================================================================
// spotwrap-core/src/supervisor/process.rs
// ============================================================================
//
// PROCESS ABSTRACTION: Spawning and Signalling the spotDL Child
//
// The supervisor talks to the child only through the ToolSpawner and
// ToolProcess traits so the run loop can be exercised with scripted processes
// in tests. SystemSpawner is the real implementation on std::process.
//
// KEY COMPONENTS:
// - SpawnRequest: program, argument vector and working directory
// - ToolSpawner / ToolProcess: dependency injection seams
// - SystemSpawner / SystemProcess: std::process implementation
//
// On Unix the child is placed in its own process group so that termination
// reaches the ffmpeg and yt-dlp helpers spotDL starts.

// ---- Standard library imports ----
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

// ---- External crate imports ----
use log::{debug, warn};
#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;

/// Everything needed to start the child. Arguments are passed as a vector,
/// never through a shell.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub working_dir: Option<&'a Path>,
}

/// Starts child processes.
pub trait ToolSpawner: Send + Sync + 'static {
    type Process: ToolProcess + 'static;

    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Self::Process>;
}

/// A running child with piped output.
pub trait ToolProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Hands out the stdout pipe once.
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Hands out the stderr pipe once.
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Returns the exit code if the child has exited. A child killed by a
    /// signal reports `128 + signal`.
    fn try_wait(&mut self) -> io::Result<Option<i32>>;

    /// Asks the child to stop.
    fn terminate(&mut self) -> io::Result<()>;

    /// Stops the child unconditionally.
    fn kill(&mut self) -> io::Result<()>;
}

/// Spawns real processes with std::process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl ToolSpawner for SystemSpawner {
    type Process = SystemProcess;

    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Self::Process> {
        let mut cmd = Command::new(request.program);
        cmd.args(request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // spotDL is a Python program; keep its output line-buffered
            .env("PYTHONUNBUFFERED", "1");

        if let Some(dir) = request.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn()?;
        Ok(SystemProcess { child })
    }
}

/// A child started by [`SystemSpawner`].
#[derive(Debug)]
pub struct SystemProcess {
    child: Child,
}

impl SystemProcess {
    /// Signals the child's process group, which also reaches its helpers.
    #[cfg(unix)]
    fn signal_group(&self, signal: Signal) -> io::Result<()> {
        let pid = i32::try_from(self.child.id()).map_err(io::Error::other)?;
        killpg(Pid::from_raw(pid), signal)?;
        Ok(())
    }
}

impl ToolProcess for SystemProcess {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .stdout
            .take()
            .map(|pipe| Box::new(pipe) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .stderr
            .take()
            .map(|pipe| Box::new(pipe) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        match self.signal_group(Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Could not signal process group {}: {}", self.child.id(), e);
                self.child.kill()
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    fn kill(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            if let Err(e) = self.signal_group(Signal::SIGKILL) {
                debug!("Group kill for {} failed: {}", self.child.id(), e);
            }
        }
        match self.child.kill() {
            // Already reaped or exited between the check and the kill
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            other => other,
        }
    }
}

/// Maps an exit status to a single code, using `128 + signal` for children
/// killed by a signal.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
