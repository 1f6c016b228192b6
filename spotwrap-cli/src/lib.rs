// spotwrap-cli/src/lib.rs
//
// Library portion of the spotwrap CLI application.
// Contains argument definitions, the menu and the one-shot command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod prompt;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, OperationArgs};
pub use commands::check::run_check;
pub use commands::menu::run_menu;
pub use commands::run::{RunContext, run_operation};
pub use error::{CliResult, error_exit_code};
pub use interrupt::InterruptSlot;
