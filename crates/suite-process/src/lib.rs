//! # Suite Process
//!
//! Low-level process operations used by the supervisor.
//!
//! This crate provides cross-platform primitives for:
//! - Building the shell-interpreted command that launches the server
//! - Process existence verification
//! - Force kill of a process group
//! - Process-tree termination (`terminate_tree`), the single termination
//!   capability the supervisor calls

pub mod check;
pub mod execute;
pub mod terminate;
pub mod validation;

#[cfg(windows)]
pub mod terminate_windows;

// Re-export main types
pub use check::*;
pub use execute::*;
pub use terminate::*;
pub use validation::*;
