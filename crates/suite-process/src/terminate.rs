//! Process termination primitives.
//!
//! [`terminate_tree`] is the one capability the supervisor uses to end the
//! server it launched. The strategy is picked per platform here, so the
//! supervisor never branches on the OS itself:
//! - Unix: `SIGTERM` to the process group led by `pid`, not awaited.
//! - Windows: `taskkill /PID <pid> /T /F`, awaited until taskkill exits.

use suite_common::{TerminationError, TerminationResult};
use tracing::debug;

/// Request termination of `pid` and every process it spawned.
pub async fn terminate_tree(pid: u32) -> TerminationResult<()> {
    if pid == 0 {
        return Err(TerminationError::new(pid, "Invalid PID"));
    }

    #[cfg(unix)]
    {
        debug!("Sending SIGTERM to process group {}", pid);
        signal_group(pid, nix::sys::signal::Signal::SIGTERM)
    }

    #[cfg(windows)]
    {
        debug!("Killing process tree rooted at {}", pid);
        crate::terminate_windows::kill_process_tree(pid).await
    }
}

/// Force kill the group led by `pid` (SIGKILL on Unix, TerminateProcess on Windows).
pub fn force_kill(pid: u32) -> TerminationResult<()> {
    #[cfg(unix)]
    {
        signal_group(pid, nix::sys::signal::Signal::SIGKILL)
    }

    #[cfg(windows)]
    {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

        unsafe {
            let handle = match OpenProcess(PROCESS_TERMINATE, false, pid) {
                Ok(h) if !h.is_invalid() => h,
                _ => {
                    return Err(TerminationError::new(
                        pid,
                        "Failed to open process for termination",
                    ));
                }
            };

            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);

            result.map_err(|e| TerminationError::new(pid, format!("TerminateProcess failed: {}", e)))
        }
    }
}

/// Signals the process group led by `pid`.
///
/// Supervised children always lead their own group, so a missing group means
/// the tree is already gone. The bare PID is never signalled: once the leader
/// is reaped it may belong to an unrelated process.
#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> TerminationResult<()> {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            debug!("Process group {} already gone", pid);
            Ok(())
        }
        Err(e) => Err(TerminationError::new(pid, e.to_string())),
    }
}
