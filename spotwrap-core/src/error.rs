// ============================================================================
// spotwrap-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the core library
//
// Two layers live here. `ValidationError` covers every way a configuration or
// target set can be rejected before a process is spawned. `CoreError` is the
// library-wide error type that wraps validation failures together with the
// I/O and dependency problems the front-ends need to report.
//
// Process outcomes (spawn failure, non-zero exit, cancellation) are NOT
// errors: they are reported through `ExecutionResult`.

use std::io;
use thiserror::Error;

/// Reasons the argument builder refuses a configuration or target set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No targets given: provide at least one Spotify URL or .spotdl file")]
    EmptyTargets,

    #[error("Thread count must be at least 1")]
    ZeroThreads,

    #[error("Custom audio format selected but no format was entered")]
    MissingCustomFormat,

    #[error("Custom bitrate selected but no bitrate was entered")]
    MissingCustomBitrate,

    #[error("A custom search query can only be used with a single target (got {0})")]
    SearchQueryWithMultipleTargets(usize),

    #[error("Saving metadata requires a save file")]
    MissingSaveFile,

    #[error("Playlist {0} index must be at least 1")]
    ZeroPlaylistIndex(&'static str),

    #[error("Playlist start ({start}) is after playlist end ({end})")]
    InvalidPlaylistRange { start: u32, end: u32 },

    /// Raised by front-ends that tokenize a free-text argument field.
    #[error("Could not parse additional arguments '{0}': check the quoting")]
    MalformedExtraArgs(String),
}

/// Library-wide error type.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Another spotDL invocation is still running")]
    InvocationActive,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, io::Error),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
