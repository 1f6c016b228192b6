// Shared helpers for integration tests that run fake spotDL scripts.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use spotwrap_core::SupervisorOptions;

/// Writes an executable `sh` script standing in for spotDL.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Short timings so cancellation tests finish quickly.
pub fn quick_options() -> SupervisorOptions {
    SupervisorOptions {
        grace_period: Duration::from_millis(500),
        poll_interval: Duration::from_millis(10),
        drain_timeout: Duration::from_millis(500),
    }
}
