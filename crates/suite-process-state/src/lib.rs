use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of transitions kept in the history.
const MAX_HISTORY: usize = 32;

/// Lifecycle state of the supervised server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisorState {
    /// Nothing has been launched yet
    Idle,
    /// The server is launched and readiness is being polled
    Starting,
    /// Readiness was observed
    Running,
    /// Termination has been requested
    Stopping,
    /// The handle has been released
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Stopping => write!(f, "stopping"),
            SupervisorState::Stopped => write!(f, "stopped"),
        }
    }
}

impl SupervisorState {
    /// States in which the supervisor holds a process handle.
    pub fn holds_handle(&self) -> bool {
        matches!(
            self,
            SupervisorState::Starting | SupervisorState::Running | SupervisorState::Stopping
        )
    }

    /// States from which `stop()` returns immediately.
    pub fn is_inactive(&self) -> bool {
        matches!(self, SupervisorState::Idle | SupervisorState::Stopped)
    }
}

/// Rejected transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid transition for {name}: {from} -> {to}")]
pub struct InvalidTransition {
    pub name: String,
    pub from: SupervisorState,
    pub to: SupervisorState,
}

/// Represents a state transition with timestamp and optional reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: SupervisorState,
    pub to_state: SupervisorState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// State machine guarding the supervisor lifecycle.
///
/// Valid transitions:
///
/// ```text
/// Idle ──► Starting ──► Running ──► Stopping ──► Stopped
///  ▲          │                        ▲
///  └─(spawn   └────── (not ready) ─────┘
///    failed)
/// ```
///
/// A failed spawn is the one edge that goes back: `Starting -> Idle`, since
/// no handle was ever acquired. `Stopped` is terminal.
#[derive(Debug, Clone)]
pub struct SupervisorStateMachine {
    name: String,
    current_state: SupervisorState,
    state_history: Vec<StateTransition>,
}

impl SupervisorStateMachine {
    /// Create a new state machine in `Idle`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            current_state: SupervisorState::Idle,
            state_history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> SupervisorState {
        self.current_state
    }

    pub fn state_history(&self) -> &[StateTransition] {
        &self.state_history
    }

    /// Check if a transition from current state to target state is valid
    pub fn is_valid_transition(&self, target_state: SupervisorState) -> bool {
        use SupervisorState::*;

        matches!(
            (self.current_state, target_state),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, Stopping)
                | (Starting, Idle)
                | (Running, Stopping)
                | (Stopping, Stopped)
        )
    }

    /// Transition to a new state with optional reason
    pub fn transition_to(
        &mut self,
        target_state: SupervisorState,
        reason: Option<String>,
    ) -> Result<(), InvalidTransition> {
        if !self.is_valid_transition(target_state) {
            return Err(InvalidTransition {
                name: self.name.clone(),
                from: self.current_state,
                to: target_state,
            });
        }

        let from_state = self.current_state;
        self.state_history.push(StateTransition {
            from_state,
            to_state: target_state,
            timestamp: Utc::now(),
            reason,
        });
        if self.state_history.len() > MAX_HISTORY {
            self.state_history.remove(0);
        }

        self.current_state = target_state;

        tracing::debug!(
            "Supervisor {} transitioned from {} to {}",
            self.name,
            from_state,
            target_state
        );

        Ok(())
    }

    pub fn transition_to_starting(&mut self) -> Result<(), InvalidTransition> {
        self.transition_to(SupervisorState::Starting, Some("Start requested".to_string()))
    }

    pub fn transition_to_running(&mut self) -> Result<(), InvalidTransition> {
        self.transition_to(SupervisorState::Running, Some("Server is ready".to_string()))
    }

    pub fn transition_to_stopping(&mut self, reason: &str) -> Result<(), InvalidTransition> {
        self.transition_to(SupervisorState::Stopping, Some(reason.to_string()))
    }

    pub fn transition_to_stopped(&mut self) -> Result<(), InvalidTransition> {
        self.transition_to(SupervisorState::Stopped, Some("Handle released".to_string()))
    }

    /// Undo a `Starting` that never acquired a process handle.
    pub fn transition_to_idle(&mut self, reason: String) -> Result<(), InvalidTransition> {
        self.transition_to(SupervisorState::Idle, Some(reason))
    }

    /// `start()` is allowed from `Idle` only.
    pub fn can_start(&self) -> bool {
        self.current_state == SupervisorState::Idle
    }

    /// Count transitions to a specific state
    pub fn count_transitions_to(&self, state: SupervisorState) -> usize {
        self.state_history
            .iter()
            .filter(|t| t.to_state == state)
            .count()
    }
}
