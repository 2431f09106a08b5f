use crate::config::SupervisorConfig;
use crate::output::{spawn_forwarder, FileOutputWriter, OutputStream};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use suite_common::{SupervisorError, SupervisorResult};
use suite_process::{
    force_kill, shell_command_line, supervised_command, terminate_tree,
    validate_working_directory, CommandSpec,
};
use suite_process_state::{InvalidTransition, SupervisorState, SupervisorStateMachine};
use suite_readiness::{parse_probe_uri, ProbeConfig, ReadinessError, ReadinessProber};
use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// How long a server that never became ready gets to exit after the
/// termination request before it is killed.
const FAILED_START_REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the server under test for the duration of a run.
///
/// `child` is `Some` exactly while the state is `Starting`, `Running` or
/// `Stopping`.
pub struct Supervisor {
    config: SupervisorConfig,
    state_machine: SupervisorStateMachine,
    child: Option<Child>,
    pid: Option<u32>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        let state_machine = SupervisorStateMachine::new(&config.name);
        Self {
            config,
            state_machine,
            child: None,
            pid: None,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn state(&self) -> SupervisorState {
        self.state_machine.current_state()
    }

    pub fn state_machine(&self) -> &SupervisorStateMachine {
        &self.state_machine
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        self.config.endpoint().base_url()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SupervisorState::Running
    }

    /// Launch the server and wait until it answers the readiness probe.
    ///
    /// Allowed from `Idle` only; every other state yields `AlreadyRunning`.
    /// On readiness failure the server is terminated, the supervisor ends in
    /// `Stopped` and `StartupTimeout` is returned.
    pub async fn start(&mut self) -> SupervisorResult<()> {
        let result = self.launch().await;
        self.debug_check_handle();
        result
    }

    async fn launch(&mut self) -> SupervisorResult<()> {
        if !self.state_machine.can_start() {
            return Err(SupervisorError::already_running(self.state().to_string()));
        }

        self.config
            .validate()
            .map_err(|e| SupervisorError::configuration(format!("{:#}", e)))?;
        let url = self.config.readiness_url();
        parse_probe_uri(&url).map_err(|e| SupervisorError::configuration(e.to_string()))?;
        validate_working_directory(self.config.working_directory.as_deref())?;

        let log_file = match self.config.output.log_file {
            Some(ref path) => Some(Arc::new(FileOutputWriter::new(path)?)),
            None => None,
        };

        self.state_machine
            .transition_to_starting()
            .map_err(|e| SupervisorError::already_running(e.from.to_string()))?;

        let command_line = shell_command_line(&self.config.command, &self.config.args);
        info!("Starting {}: {}", self.config.name, command_line);

        let spec = CommandSpec {
            command: &self.config.command,
            args: &self.config.args,
            working_directory: self.config.working_directory.as_deref(),
            environment: Some(&self.config.environment),
        };

        let child = match supervised_command(&spec).spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to spawn {}: {}", self.config.name, e);
                let transition = self.state_machine.transition_to_idle(format!("Spawn failed: {}", e));
                self.check_transition(transition);
                return Err(SupervisorError::spawn_failed(command_line, e.to_string()));
            }
        };

        self.pid = child.id();
        self.child = Some(child);
        info!(
            "Process spawned successfully: {} (PID: {})",
            self.config.name,
            self.pid.unwrap_or_default()
        );

        let prober = ReadinessProber::new(
            ProbeConfig::new(url.clone())
                .with_max_attempts(self.config.readiness.max_attempts)
                .with_interval(self.config.readiness.interval)
                .with_request_timeout(self.config.readiness.request_timeout),
        );

        let readiness = if self.config.readiness.abort_on_exit {
            let name = self.config.name.clone();
            let child = self.child.as_mut();
            match child {
                Some(child) => {
                    prober
                        .wait_until_ready_while(|| match child.try_wait() {
                            Ok(None) => true,
                            Ok(Some(status)) => {
                                warn!("{} exited during startup: {}", name, status);
                                false
                            }
                            Err(_) => true,
                        })
                        .await
                }
                None => prober.wait_until_ready().await,
            }
        } else {
            prober.wait_until_ready().await
        };

        match readiness {
            Ok(attempt) => {
                self.attach_output(log_file);
                self.state_machine
                    .transition_to_running()
                    .map_err(|e| SupervisorError::configuration(e.to_string()))?;
                info!(
                    "{} is running at {} (ready after {} attempt(s))",
                    self.config.name,
                    self.base_url(),
                    attempt
                );
                Ok(())
            }
            Err(e) => {
                error!("{} did not become ready: {}", self.config.name, e);
                let transition = self.state_machine.transition_to_stopping("Readiness not observed");
                self.check_transition(transition);
                self.terminate_and_reap(FAILED_START_REAP_TIMEOUT).await;
                let transition = self.state_machine.transition_to_stopped();
                self.check_transition(transition);

                Err(match e {
                    ReadinessError::StartupTimeout { url, attempts } => {
                        SupervisorError::startup_timeout(url, attempts)
                    }
                    ReadinessError::InvalidUrl { .. } => {
                        SupervisorError::configuration(e.to_string())
                    }
                })
            }
        }
    }

    /// Request termination of the server and release the handle.
    ///
    /// A no-op when nothing is running. Termination failures are logged and
    /// never returned. On Unix the signal is sent and not awaited; on
    /// Windows the tree-kill command is awaited.
    pub async fn stop(&mut self) -> SupervisorResult<()> {
        if self.state().is_inactive() {
            debug!("Stop requested for {} while {}", self.config.name, self.state());
            return Ok(());
        }

        info!("Stopping {}", self.config.name);
        let transition = self.state_machine.transition_to_stopping("Stop requested");
        self.check_transition(transition);
        self.request_termination().await;

        if let Some(mut child) = self.child.take() {
            // Reap in the background so the shell wrapper does not linger as
            // a zombie. The handle still kills on drop if the runtime ends first.
            tokio::spawn(async move {
                let _ = child.wait().await;
            });
        }
        self.pid = None;

        let transition = self.state_machine.transition_to_stopped();
        self.check_transition(transition);
        self.debug_check_handle();
        info!("{} stopped", self.config.name);
        Ok(())
    }

    /// Like [`stop`](Self::stop), but waits up to `grace` for the server to
    /// exit and force-kills it afterwards. Returns the exit status when one
    /// was observed.
    pub async fn stop_and_wait(&mut self, grace: Duration) -> SupervisorResult<Option<ExitStatus>> {
        if self.state().is_inactive() {
            return Ok(None);
        }

        info!("Stopping {} (grace {:?})", self.config.name, grace);
        let transition = self.state_machine.transition_to_stopping("Stop requested");
        self.check_transition(transition);
        let status = self.terminate_and_reap(grace).await;
        let transition = self.state_machine.transition_to_stopped();
        self.check_transition(transition);
        self.debug_check_handle();
        Ok(status)
    }

    /// A rejected transition means the lifecycle code itself is wrong.
    fn check_transition(&self, result: Result<(), InvalidTransition>) {
        if let Err(ref e) = result {
            error!("{}", e);
        }
        debug_assert!(result.is_ok(), "rejected supervisor transition");
    }

    /// The child handle is held exactly while Starting, Running or Stopping.
    fn debug_check_handle(&self) {
        debug_assert_eq!(
            self.child.is_some(),
            self.state().holds_handle(),
            "handle/state mismatch in {}",
            self.state()
        );
    }

    fn attach_output(&mut self, log_file: Option<Arc<FileOutputWriter>>) {
        let Some(child) = self.child.as_mut() else {
            return;
        };

        if let Some(stdout) = child.stdout.take() {
            spawn_forwarder(
                stdout,
                self.config.name.clone(),
                OutputStream::Stdout,
                log_file.clone(),
            );
        }

        if let Some(stderr) = child.stderr.take() {
            spawn_forwarder(stderr, self.config.name.clone(), OutputStream::Stderr, log_file);
        }
    }

    async fn request_termination(&self) {
        if let Some(pid) = self.pid {
            if let Err(e) = terminate_tree(pid).await {
                warn!("Failed to terminate {}: {}", self.config.name, e);
            }
        }
    }

    /// Terminate, wait up to `grace`, force-kill if still alive, release the handle.
    async fn terminate_and_reap(&mut self, grace: Duration) -> Option<ExitStatus> {
        self.request_termination().await;

        let pid = self.pid.take();
        let mut child = self.child.take()?;

        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("{} exited: {}", self.config.name, status);
                Some(status)
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for {}: {}", self.config.name, e);
                None
            }
            Err(_) => {
                warn!(
                    "{} did not exit within {:?}, killing it",
                    self.config.name, grace
                );
                if let Some(pid) = pid {
                    if let Err(e) = force_kill(pid) {
                        warn!("Force kill of {} failed: {}", self.config.name, e);
                    }
                }
                let _ = child.start_kill();
                child.wait().await.ok()
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Some(pid) = self.pid {
                warn!("Supervisor for {} dropped while server alive, killing it", self.config.name);
                let _ = force_kill(pid);
            }
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("pid", &self.pid)
            .finish()
    }
}
