//! # Suite Supervisor
//!
//! Starts the server under test as a child process, waits until it answers
//! HTTP, forwards its output into the log and terminates it at the end of the
//! run.
//!
//! ```rust,no_run
//! use suite_supervisor::{Supervisor, SupervisorConfig};
//!
//! # async fn example() -> Result<(), suite_common::SupervisorError> {
//! let mut supervisor = Supervisor::new(SupervisorConfig::default());
//! supervisor.start().await?;
//! // ... run the suites against supervisor.base_url() ...
//! supervisor.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod output;
pub mod supervisor;

pub use config::{OutputConfig, ReadinessConfig, SupervisorConfig};
pub use output::{FileOutputWriter, OutputStream};
pub use supervisor::Supervisor;

// Re-export so callers need a single dependency
pub use suite_common::{SupervisorError, SupervisorResult};
pub use suite_process_state::SupervisorState;
