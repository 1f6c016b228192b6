//! Outcome of one spotDL invocation: classification, transcript and timing.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::summary::FailureReport;

/// Which pipe a line of output arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        })
    }
}

/// One line written by the child, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub text: String,
}

impl OutputLine {
    pub fn new(stream: StreamKind, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
        }
    }

    pub fn stdout(text: impl Into<String>) -> Self {
        Self::new(StreamKind::Stdout, text)
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self::new(StreamKind::Stderr, text)
    }
}

/// How an invocation ended. Derived from the exit code only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum ExitClassification {
    Success,
    NonZeroExit(i32),
    /// The executable could not be located or started; spotDL never ran.
    SpawnFailure(String),
    Cancelled,
}

impl ExitClassification {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitClassification::Success)
    }
}

impl fmt::Display for ExitClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitClassification::Success => write!(f, "completed successfully"),
            ExitClassification::NonZeroExit(code) => write!(f, "failed with exit code {code}"),
            ExitClassification::SpawnFailure(reason) => write!(f, "could not be started: {reason}"),
            ExitClassification::Cancelled => write!(f, "was cancelled"),
        }
    }
}

/// Everything a caller learns about a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub operation: Operation,
    pub classification: ExitClassification,
    /// Every line in arrival order, tagged with its stream.
    pub transcript: Vec<OutputLine>,
    pub duration: Duration,
    /// Program followed by its arguments, exactly as executed.
    pub command: Vec<String>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.classification.is_success()
    }

    /// Transcript lines from one stream only.
    pub fn lines(&self, stream: StreamKind) -> impl Iterator<Item = &str> {
        self.transcript
            .iter()
            .filter(move |line| line.stream == stream)
            .map(|line| line.text.as_str())
    }

    /// Songs the output reports as skipped or failed.
    pub fn failures(&self) -> FailureReport {
        FailureReport::scan(self.transcript.iter().map(|line| line.text.as_str()))
    }

    /// One-line status summary for display.
    ///
    /// The failure scan only adds detail; the headline always follows the
    /// exit classification.
    pub fn summary(&self) -> String {
        let name = self.operation.display_name();
        let failed = self.failures().len();
        match &self.classification {
            ExitClassification::Success if failed > 0 => format!(
                "{name} completed, but {failed} song(s) were skipped or failed"
            ),
            ExitClassification::Success => format!("{name} completed successfully"),
            ExitClassification::NonZeroExit(code) if failed > 0 => format!(
                "{name} failed with exit code {code} ({failed} song(s) skipped or failed)"
            ),
            ExitClassification::NonZeroExit(code) => format!(
                "{name} failed with exit code {code}; no specific song failures detected, review the log"
            ),
            ExitClassification::SpawnFailure(reason) => format!(
                "{name} could not start spotDL: {reason}"
            ),
            ExitClassification::Cancelled => format!("{name} was cancelled"),
        }
    }

    /// Process exit code a command-line front-end should return.
    pub fn exit_code(&self) -> i32 {
        match self.classification {
            ExitClassification::Success => 0,
            ExitClassification::NonZeroExit(code) => code,
            ExitClassification::SpawnFailure(_) => 127,
            ExitClassification::Cancelled => 130,
        }
    }
}
