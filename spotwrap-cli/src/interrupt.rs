//! Ctrl-C handling.
//!
//! spotDL runs in its own process group, so the terminal's interrupt reaches
//! only this process. The handler forwards it as a cancel request to the
//! running invocation; with nothing running it exits like an interrupted
//! program would.

use std::sync::{Arc, Mutex};

use spotwrap_core::CancellationToken;

use crate::error::CliResult;

/// Exit status of a process stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Holds the token Ctrl-C should trigger.
#[derive(Debug, Clone, Default)]
pub struct InterruptSlot(Arc<Mutex<Option<CancellationToken>>>);

impl InterruptSlot {
    /// Installs the process-wide Ctrl-C handler. Call once.
    pub fn install() -> CliResult<Self> {
        let slot = Self::default();
        let handler_slot = slot.clone();
        ctrlc::set_handler(move || {
            if !handler_slot.interrupt() {
                std::process::exit(EXIT_INTERRUPTED);
            }
        })
        .map_err(|e| crate::cli_error!("Failed to install Ctrl-C handler: {e}"))?;
        Ok(slot)
    }

    /// Routes the next Ctrl-C to `token`.
    pub fn arm(&self, token: CancellationToken) {
        if let Ok(mut guard) = self.0.lock() {
            *guard = Some(token);
        }
    }

    pub fn disarm(&self) {
        if let Ok(mut guard) = self.0.lock() {
            guard.take();
        }
    }

    /// Cancels the armed invocation. Returns false when nothing was armed.
    pub fn interrupt(&self) -> bool {
        let token = self.0.lock().ok().and_then(|mut guard| guard.take());
        match token {
            Some(token) => {
                eprintln!("\nCancelling spotDL (press Ctrl-C again to quit)...");
                token.cancel();
                true
            }
            None => false,
        }
    }
}
