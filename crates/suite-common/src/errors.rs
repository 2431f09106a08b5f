//! Error types for the test-subject supervisor.
//!
//! Two families live here:
//! - [`SupervisorError`]: returned to callers of `start()`. Every variant is
//!   fatal to the setup step that produced it.
//! - [`TerminationError`]: produced by the platform termination primitives.
//!   The supervisor logs these and never propagates them out of `stop()`.

use thiserror::Error;

/// Result type alias for supervisor operations.
pub type SupervisorResult<T> = std::result::Result<T, SupervisorError>;

/// Errors surfaced by the process supervisor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// `start()` was called while the supervisor was not idle.
    #[error("Server is already running (state: {state})")]
    AlreadyRunning { state: String },

    /// Readiness was never observed within the attempt budget.
    #[error("Server failed to start: {url} was not ready after {attempts} attempts")]
    StartupTimeout { url: String, attempts: u32 },

    /// The subordinate command could not be launched at all.
    #[error("Failed to spawn server command '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    /// The supervisor configuration cannot be used to build a probe or a command.
    #[error("Invalid supervisor configuration: {reason}")]
    Configuration { reason: String },
}

impl SupervisorError {
    pub fn already_running(state: impl Into<String>) -> Self {
        Self::AlreadyRunning {
            state: state.into(),
        }
    }

    pub fn startup_timeout(url: impl Into<String>, attempts: u32) -> Self {
        Self::StartupTimeout {
            url: url.into(),
            attempts,
        }
    }

    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// True for the readiness failure, which callers usually want to report
    /// with the probed URL.
    pub fn is_startup_timeout(&self) -> bool {
        matches!(self, Self::StartupTimeout { .. })
    }
}

/// Failure of a termination mechanism (signal delivery or tree-kill).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to terminate process {pid}: {reason}")]
pub struct TerminationError {
    pub pid: u32,
    pub reason: String,
}

impl TerminationError {
    pub fn new(pid: u32, reason: impl Into<String>) -> Self {
        Self {
            pid,
            reason: reason.into(),
        }
    }
}

/// Result type for termination primitives.
pub type TerminationResult<T> = std::result::Result<T, TerminationError>;
