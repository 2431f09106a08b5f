//! Run-level setup and teardown.

use crate::{LifecycleError, LifecycleResult, RunContext};
use async_trait::async_trait;
use suite_supervisor::{Supervisor, SupervisorConfig};
use tracing::{debug, info, warn};

/// Start the server for this run and store it in `ctx`.
///
/// The supervisor is stored only after readiness was observed. Any start
/// failure is returned unchanged and leaves the context empty.
pub async fn global_setup(ctx: &mut RunContext, config: SupervisorConfig) -> LifecycleResult<()> {
    if ctx.has_supervisor() {
        return Err(LifecycleError::slot_occupied(ctx.run_id()));
    }

    info!("Global setup for {}: starting {}", ctx.run_id(), config.name);
    let mut supervisor = Supervisor::new(config);
    supervisor.start().await?;
    ctx.put_supervisor(supervisor)
}

/// Stop the server stored in `ctx`, if any. Never fails.
pub async fn global_teardown(ctx: &mut RunContext) {
    let Some(mut supervisor) = ctx.take_supervisor() else {
        debug!("Global teardown for {}: no server to stop", ctx.run_id());
        return;
    };

    info!("Global teardown for {}", ctx.run_id());
    if let Err(e) = supervisor.stop().await {
        warn!("Failed to stop server during teardown: {}", e);
    }
}

/// Hooks a runner invokes around its suites.
#[async_trait]
pub trait SuiteHooks: Send {
    async fn setup(&mut self, ctx: &mut RunContext) -> LifecycleResult<()>;

    async fn teardown(&mut self, ctx: &mut RunContext);
}

/// [`SuiteHooks`] that launch one supervised server per run.
#[derive(Debug, Clone)]
pub struct SupervisorHooks {
    config: SupervisorConfig,
}

impl SupervisorHooks {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }
}

#[async_trait]
impl SuiteHooks for SupervisorHooks {
    async fn setup(&mut self, ctx: &mut RunContext) -> LifecycleResult<()> {
        global_setup(ctx, self.config.clone()).await
    }

    async fn teardown(&mut self, ctx: &mut RunContext) {
        global_teardown(ctx).await
    }
}
