//! Core library for driving the spotDL music downloader.
//!
//! This crate validates download options, turns them into a spotDL command
//! line, runs spotDL as a supervised child process with streamed output and
//! cancellation, and classifies the outcome.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use spotwrap_core::{
//!     CancellationToken, DownloadConfiguration, InvocationRequest, Operation, OutputLine,
//!     TargetSet, supervisor,
//! };
//! use std::path::PathBuf;
//!
//! let config = DownloadConfiguration::new(PathBuf::from("music"));
//! let targets = TargetSet::parse("https://open.spotify.com/track/abc").unwrap();
//!
//! let request =
//!     InvocationRequest::from_configuration(Operation::Download, "spotdl", &config, targets.as_slice())
//!         .unwrap();
//!
//! let mut print = |line: &OutputLine| println!("{}", line.text);
//! let result = supervisor::run(&request, &mut print, &CancellationToken::new());
//! println!("{}", result.summary());
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod operation;
pub mod readiness;
pub mod result;
pub mod session;
pub mod summary;
pub mod supervisor;

// Re-exports for public API
pub use command::{SpotdlArgsBuilder, build_arguments, with_state_extension};
pub use config::{
    AudioFormat, Bitrate, DownloadConfiguration, DownloadConfigurationBuilder, OverwritePolicy,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use operation::{Operation, TargetSet};
pub use readiness::{ReadinessReport, ToolStatus, check_readiness};
pub use result::{ExecutionResult, ExitClassification, OutputLine, StreamKind};
pub use session::Session;
pub use summary::FailureReport;
pub use supervisor::{
    CancellationToken, InvocationHandle, InvocationRequest, NullSink, OutputSink, Supervisor,
    SupervisorOptions,
};
