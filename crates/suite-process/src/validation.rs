//! Validation of launch parameters before anything is spawned.

use std::path::Path;
use suite_common::{SupervisorError, SupervisorResult};

/// Validate that a command string is usable.
pub fn validate_command(command: &str) -> SupervisorResult<()> {
    if command.trim().is_empty() {
        return Err(SupervisorError::configuration("Command cannot be empty"));
    }

    if command.contains('\0') {
        return Err(SupervisorError::configuration(
            "Command cannot contain NUL bytes",
        ));
    }

    Ok(())
}

/// Validate that the working directory exists, when one is given.
pub fn validate_working_directory(dir: Option<&Path>) -> SupervisorResult<()> {
    match dir {
        Some(dir) if !dir.is_dir() => Err(SupervisorError::configuration(format!(
            "Working directory does not exist: {}",
            dir.display()
        ))),
        _ => Ok(()),
    }
}
