use crate::{LifecycleError, LifecycleResult};
use suite_common::RunId;
use suite_supervisor::Supervisor;

/// State shared between the setup and teardown hooks of one run.
///
/// Holds at most one supervisor. Contexts are independent of each other, so
/// two runs in the same process never observe each other's server.
#[derive(Debug)]
pub struct RunContext {
    run_id: RunId,
    supervisor: Option<Supervisor>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_run_id(RunId::generate())
    }

    pub fn with_run_id(run_id: RunId) -> Self {
        Self {
            run_id,
            supervisor: None,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Store the supervisor. Fails if one is already stored.
    pub fn put_supervisor(&mut self, supervisor: Supervisor) -> LifecycleResult<()> {
        if self.supervisor.is_some() {
            return Err(LifecycleError::slot_occupied(&self.run_id));
        }
        self.supervisor = Some(supervisor);
        Ok(())
    }

    pub fn take_supervisor(&mut self) -> Option<Supervisor> {
        self.supervisor.take()
    }

    pub fn supervisor(&self) -> Option<&Supervisor> {
        self.supervisor.as_ref()
    }

    pub fn has_supervisor(&self) -> bool {
        self.supervisor.is_some()
    }

    /// Base URL of the stored server, if any.
    pub fn base_url(&self) -> Option<String> {
        self.supervisor.as_ref().map(Supervisor::base_url)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
