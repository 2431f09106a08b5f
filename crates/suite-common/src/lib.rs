//! # Suite Common
//!
//! Common types and errors shared across the suite crates.
//!
//! This crate provides the foundational pieces the supervisor, the readiness
//! prober and the lifecycle hooks build upon:
//! - The supervisor error taxonomy
//! - Termination errors reported by the low-level process primitives
//! - Endpoint and run identifiers

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{SupervisorError, SupervisorResult, TerminationError, TerminationResult};
pub use types::{Endpoint, RunId, DEFAULT_HOST, DEFAULT_PORT};
