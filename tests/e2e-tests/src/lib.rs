// E2E test framework for the supervisor and the to-do application

pub mod assertions;
pub mod client;

pub use client::TodoClient;

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::time::{Duration, Instant};
use suite_supervisor::{Supervisor, SupervisorConfig};
use tempfile::TempDir;

/// Interval used by the suites. Short, so failure paths stay fast.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Best-effort test logging; repeated initialisation is ignored.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// A port nobody listens on at the time of the call.
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Failed to reserve a free port")
}

/// Scratch directory removed on drop.
pub fn create_test_dir(test_name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("e2e-test-{}-", test_name))
        .tempdir()
        .expect("Failed to create test directory")
}

/// Supervisor configuration launching the to-do binary at `binary` on `port`.
pub fn todo_app_config(binary: &str, name: &str, port: u16, extra_args: &[&str]) -> SupervisorConfig {
    let mut args = vec!["--port".to_string(), port.to_string()];
    args.extend(extra_args.iter().map(|arg| arg.to_string()));

    SupervisorConfig {
        name: name.to_string(),
        ..SupervisorConfig::default()
    }
    .with_port(port)
    .with_command(binary, args)
    .with_readiness(50, POLL_INTERVAL)
}

/// True when something accepts connections on the loopback `port`.
pub fn port_is_open(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_ok()
}

/// Poll until the port stops accepting connections.
pub async fn wait_for_port_closed(port: u16, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !port_is_open(port) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !port_is_open(port)
}

/// Poll until `pid` no longer exists.
pub async fn wait_for_process_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match suite_process::process_exists(pid) {
            Ok(false) => return true,
            Ok(true) if Instant::now() >= deadline => return false,
            Ok(true) => tokio::time::sleep(Duration::from_millis(50)).await,
            Err(_) => return false,
        }
    }
}

/// Poll until a PID file appears and parses.
pub async fn wait_for_pid_file(path: &Path, timeout: Duration) -> Option<u32> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(contents) = std::fs::read_to_string(path) {
            if let Ok(pid) = contents.trim().parse() {
                return Some(pid);
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    None
}

/// Environment variable through which `suite-runner` hands its ready server
/// to the suites.
pub const BASE_URL_ENV: &str = "TODO_BASE_URL";

/// A ready to-do server plus a client bound to it.
///
/// Either launched here on a free port, or an external server announced
/// through [`BASE_URL_ENV`]. External servers are shared by every test, so
/// tests using them must run serially.
pub struct TestServer {
    supervisor: Option<Supervisor>,
    pub client: TodoClient,
}

impl TestServer {
    /// Attach to `$TODO_BASE_URL` when set, otherwise launch `binary`.
    pub async fn start(binary: &str, name: &str) -> TestServer {
        init_test_logging();

        match std::env::var(BASE_URL_ENV) {
            Ok(base_url) if !base_url.trim().is_empty() => Self::attach(&base_url).await,
            _ => Self::launch(binary, name).await,
        }
    }

    /// Use an already running server, emptying it first.
    pub async fn attach(base_url: &str) -> TestServer {
        let client = TodoClient::new(base_url);
        let status = client
            .reset()
            .await
            .unwrap_or_else(|e| panic!("Failed to reset {}: {}", base_url, e));
        assert!(status.is_success(), "Reset of {} answered {}", base_url, status);

        TestServer {
            supervisor: None,
            client,
        }
    }

    /// Start the to-do binary on a free port and wait for readiness.
    pub async fn launch(binary: &str, name: &str) -> TestServer {
        let port = free_port();
        let mut supervisor = Supervisor::new(todo_app_config(binary, name, port, &[]));
        supervisor
            .start()
            .await
            .unwrap_or_else(|e| panic!("Failed to start {}: {}", name, e));

        let client = TodoClient::new(&supervisor.base_url());
        TestServer {
            supervisor: Some(supervisor),
            client,
        }
    }

    /// True when the server belongs to someone else.
    pub fn is_attached(&self) -> bool {
        self.supervisor.is_none()
    }

    /// Stops the server if it was launched here; attached servers keep running.
    pub async fn stop(mut self) {
        if let Some(mut supervisor) = self.supervisor.take() {
            let _ = supervisor.stop_and_wait(Duration::from_secs(5)).await;
        }
    }
}
