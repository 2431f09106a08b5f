//! Windows process-tree termination.
//!
//! Windows offers no signal that reaches a process and its descendants, so the
//! tree is ended with `taskkill /PID <pid> /T /F`. The `/T` switch walks the
//! parent/child chain, which covers the `cmd /C` wrapper, the interpreter it
//! starts and any worker the interpreter forks.

use std::process::Output;
use std::time::Duration;
use suite_common::{TerminationError, TerminationResult};
use tracing::debug;

/// Upper bound on a single taskkill invocation.
const TASKKILL_TIMEOUT: Duration = Duration::from_secs(10);

/// Kill `pid` and all of its descendants, waiting for taskkill to finish.
pub async fn kill_process_tree(pid: u32) -> TerminationResult<()> {
    if pid == 0 {
        return Err(TerminationError::new(pid, format!("Invalid PID: {}", pid)));
    }

    let output = tokio::time::timeout(
        TASKKILL_TIMEOUT,
        tokio::process::Command::new("taskkill")
            .args(taskkill_args(pid))
            .output(),
    )
    .await
    .map_err(|_| {
        TerminationError::new(pid, format!("taskkill timed out after {:?}", TASKKILL_TIMEOUT))
    })?
    .map_err(|e| TerminationError::new(pid, format!("Failed to run taskkill: {}", e)))?;

    check_output(pid, output)
}

fn taskkill_args(pid: u32) -> Vec<String> {
    vec![
        "/PID".to_string(),
        pid.to_string(),
        "/T".to_string(),
        "/F".to_string(),
    ]
}

fn check_output(pid: u32, output: Output) -> TerminationResult<()> {
    if output.status.success() {
        debug!("taskkill completed for PID {}", pid);
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(TerminationError::new(
        pid,
        format!("taskkill exited with {}: {}", output.status, stderr.trim()),
    ))
}
