// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for multiplexer commands.
pub const MUX_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for bead store CLI commands.
pub const BEAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the admin alert hook.
pub const ALERT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for `lsof` during session-log discovery.
pub const LSOF_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Combined stdout+stderr of a finished subprocess, for error messages.
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.trim().is_empty() {
            text.push('\n');
        }
        text.push_str(stderr.trim_end());
    }
    text
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
