//! # Suite Lifecycle
//!
//! Glue between a test runner and the supervisor: a run-scoped
//! [`RunContext`] plus the [`global_setup`] / [`global_teardown`] hooks.

pub mod context;
pub mod hooks;

pub use context::RunContext;
pub use hooks::{global_setup, global_teardown, SuiteHooks, SupervisorHooks};

use suite_common::{RunId, SupervisorError};
use thiserror::Error;

/// Errors raised by the lifecycle hooks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("Run {run_id} already holds a server")]
    SlotOccupied { run_id: String },
}

impl LifecycleError {
    pub fn slot_occupied(run_id: &RunId) -> Self {
        Self::SlotOccupied {
            run_id: run_id.to_string(),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
