//! Process existence checking.
//!
//! Provides a cross-platform function to check if a process exists and is running.

use suite_common::{TerminationError, TerminationResult};

/// Check if a process with the given PID exists and is running.
///
/// On Unix systems this uses `kill(pid, 0)`, which sends no signal but checks
/// if the process exists. On Windows it uses `OpenProcess`.
///
/// A zombie (exited but not yet reaped) still counts as existing on Unix.
/// Callers that own the child should reap it before asking.
///
/// # Returns
///
/// * `Ok(true)` - Process exists
/// * `Ok(false)` - Process does not exist
/// * `Err(_)` - The check itself failed
///
/// # Examples
///
/// ```rust,no_run
/// use suite_process::process_exists;
///
/// if process_exists(1234).unwrap_or(false) {
///     println!("Process 1234 is running");
/// }
/// ```
pub fn process_exists(pid: u32) -> TerminationResult<bool> {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(windows)]
    {
        process_exists_windows(pid)
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> TerminationResult<bool> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let nix_pid = Pid::from_raw(pid as i32);

    match kill(nix_pid, None) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        // Exists, but belongs to someone else
        Err(nix::errno::Errno::EPERM) => Ok(true),
        Err(e) => Err(TerminationError::new(
            pid,
            format!("Failed to check process: {}", e),
        )),
    }
}

#[cfg(windows)]
fn process_exists_windows(pid: u32) -> TerminationResult<bool> {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        let handle: HANDLE = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(h) => h,
            Err(e) => {
                // ERROR_INVALID_PARAMETER or ERROR_ACCESS_DENIED usually means the process is gone
                let error_code = e.code().0 as u32;
                const ERROR_INVALID_PARAMETER: u32 = 0x80070057;
                const ERROR_ACCESS_DENIED: u32 = 0x80070005;

                if error_code == ERROR_INVALID_PARAMETER || error_code == ERROR_ACCESS_DENIED {
                    return Ok(false);
                }
                return Err(TerminationError::new(
                    pid,
                    format!("Failed to check process: {}", e),
                ));
            }
        };

        let _ = CloseHandle(handle);
        Ok(true)
    }
}
