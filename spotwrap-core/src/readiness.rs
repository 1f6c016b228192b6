// ============================================================================
// spotwrap-core/src/readiness.rs
// ============================================================================
//
// READINESS CHECK: Checking for spotDL and FFmpeg
//
// Runs `spotdl --version` and `ffmpeg -version` once so the front-ends can
// tell the user what is missing before they start an operation. The check is
// an explicit call whose report the caller keeps; nothing here is cached
// globally.

// ---- Standard library imports ----
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ---- External crate imports ----
use log::{debug, warn};
use serde::{Deserialize, Serialize};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

/// Default executable names looked up on `PATH`.
pub const DEFAULT_SPOTDL: &str = "spotdl";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Outcome of probing one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "kebab-case")]
pub enum ToolStatus {
    /// The tool ran; carries the first line of its version output.
    Available(String),
    /// The executable could not be found.
    Missing,
    /// The executable exists but did not run cleanly.
    Failed(String),
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ToolStatus::Available(_))
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Available(version) => write!(f, "available ({version})"),
            ToolStatus::Missing => write!(f, "not found"),
            ToolStatus::Failed(reason) => write!(f, "not working: {reason}"),
        }
    }
}

/// Result of probing every tool the wrapper relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub spotdl_path: PathBuf,
    pub spotdl: ToolStatus,
    pub ffmpeg: ToolStatus,
}

impl ReadinessReport {
    /// spotDL itself can be started.
    pub fn is_ready(&self) -> bool {
        self.spotdl.is_available()
    }

    /// Human-readable problems with installation hints, empty when all good.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        match &self.spotdl {
            ToolStatus::Available(_) => {}
            ToolStatus::Missing => problems.push(format!(
                "spotDL ('{}') was not found. Install it with: pip install spotdl",
                self.spotdl_path.display()
            )),
            ToolStatus::Failed(reason) => problems.push(format!(
                "spotDL ('{}') did not run correctly: {reason}. Try reinstalling it with: pip install --upgrade spotdl",
                self.spotdl_path.display()
            )),
        }
        match &self.ffmpeg {
            ToolStatus::Available(_) => {}
            ToolStatus::Missing => problems.push(
                "FFmpeg was not found. spotDL needs it to convert audio; install it or run: spotdl --download-ffmpeg"
                    .to_string(),
            ),
            ToolStatus::Failed(reason) => {
                problems.push(format!("FFmpeg did not run correctly: {reason}"))
            }
        }
        problems
    }
}

/// Checks spotDL at `spotdl_path` and FFmpeg on `PATH`.
pub fn check_readiness(spotdl_path: &Path) -> ReadinessReport {
    check_readiness_with(spotdl_path, Path::new(DEFAULT_FFMPEG))
}

/// Checks both tools at explicit locations.
pub fn check_readiness_with(spotdl_path: &Path, ffmpeg_path: &Path) -> ReadinessReport {
    ReadinessReport {
        spotdl_path: spotdl_path.to_path_buf(),
        spotdl: check_tool(spotdl_path, "--version"),
        ffmpeg: check_tool(ffmpeg_path, "-version"),
    }
}

/// Runs `program version_arg` and reports its first output line.
pub fn check_tool(program: &Path, version_arg: &str) -> ToolStatus {
    match check_dependency(program, version_arg) {
        Ok(version) => ToolStatus::Available(version),
        Err(CoreError::DependencyNotFound(_)) => ToolStatus::Missing,
        Err(CoreError::CommandStart(_, e)) => ToolStatus::Failed(e.to_string()),
        Err(e) => ToolStatus::Failed(e.to_string()),
    }
}

/// Runs the version command of an external tool.
///
/// # Returns
///
/// * `Ok(String)` - first non-empty line of the version output
/// * `Err(CoreError::DependencyNotFound)` - the executable does not exist
/// * `Err(CoreError::CommandStart)` - the executable exists but failed to start
/// * `Err(CoreError::OperationFailed)` - the version command exited non-zero
pub(crate) fn check_dependency(program: &Path, version_arg: &str) -> CoreResult<String> {
    let output = Command::new(program)
        .arg(version_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("unknown version")
                .to_string();
            debug!("Found {}: {}", program.display(), version);
            Ok(version)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .map(str::trim)
                .rfind(|line| !line.is_empty())
                .map_or_else(|| output.status.to_string(), str::to_string);
            warn!("'{} {}' failed: {}", program.display(), version_arg, reason);
            Err(CoreError::OperationFailed(reason))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Dependency '{}' not found.", program.display());
            Err(CoreError::DependencyNotFound(program.display().to_string()))
        }
        Err(e) => {
            warn!("Failed to start dependency check '{}': {}", program.display(), e);
            Err(CoreError::CommandStart(program.display().to_string(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_failing_tool() {
        let status = check_tool(Path::new("false"), "--version");
        assert!(matches!(status, ToolStatus::Failed(_)));
    }

    #[test]
    fn test_missing_tool() {
        let status = check_tool(Path::new("/nonexistent/spotdl"), "--version");
        assert_eq!(status, ToolStatus::Missing);
    }

    #[test]
    fn test_report_problems() {
        let report = ReadinessReport {
            spotdl_path: PathBuf::from("spotdl"),
            spotdl: ToolStatus::Missing,
            ffmpeg: ToolStatus::Available("ffmpeg version 6.1".into()),
        };
        assert!(!report.is_ready());
        let problems = report.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("pip install spotdl"));
    }

    #[test]
    fn test_ready_report() {
        let report = ReadinessReport {
            spotdl_path: PathBuf::from("spotdl"),
            spotdl: ToolStatus::Available("4.2.5".into()),
            ffmpeg: ToolStatus::Available("ffmpeg version 6.1".into()),
        };
        assert!(report.is_ready());
        assert!(report.problems().is_empty());
    }
}
