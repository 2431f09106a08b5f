//! Process entry point shared by every binary that serves the app.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{create_router, TodoStore};

/// To-do server with fault injection for supervisor testing
#[derive(Parser, Debug)]
#[command(name = "todo-app")]
#[command(about = "To-do web application used as the server under test", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "5000")]
    port: u16,

    /// Milliseconds to wait before binding the port
    #[arg(long, default_value = "0")]
    startup_delay_ms: u64,

    /// Exit immediately with this code instead of serving
    #[arg(long)]
    exit_code: Option<i32>,

    /// Never bind the port; wait for a termination signal
    #[arg(long)]
    never_listen: bool,

    /// Launch a copy of this program as a child process (never listens)
    #[arg(long)]
    spawn_worker: bool,

    /// PID file path to write process ID
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// PID file path handed to the worker started by --spawn-worker
    #[arg(long)]
    worker_pid_file: Option<PathBuf>,
}

/// Parse arguments, serve until a termination signal, exit the process.
pub async fn main_entry() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    info!("Starting todo-app with args: {:?}", args);

    if let Some(path) = &args.pid_file {
        if let Err(e) = write_pid_file(path) {
            error!("Failed to write PID file: {}", e);
            std::process::exit(1);
        }
        info!("Wrote PID to file: {}", path.display());
    }

    // The PID file is left behind so callers can check the process is gone
    if let Some(code) = args.exit_code {
        warn!("Exiting immediately with code {}", code);
        std::process::exit(code);
    }

    let code = match run(&args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("todo-app failed: {:#}", e);
            1
        }
    };

    if let Some(path) = &args.pid_file {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove PID file: {}", e);
        }
    }

    info!("todo-app stopped");
    std::process::exit(code);
}

async fn run(args: &Args) -> Result<()> {
    // Held until shutdown; the worker is not tied to this handle's lifetime
    let _worker = if args.spawn_worker {
        Some(spawn_worker(args.worker_pid_file.as_deref())?)
    } else {
        None
    };

    if args.startup_delay_ms > 0 {
        info!("Delaying startup by {}ms", args.startup_delay_ms);
        sleep(Duration::from_millis(args.startup_delay_ms)).await;
    }

    if args.never_listen {
        info!("Not listening (--never-listen); waiting for shutdown signal");
        shutdown_signal().await;
        return Ok(());
    }

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    let app = create_router(Arc::new(TodoStore::new()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

fn spawn_worker(pid_file: Option<&Path>) -> Result<tokio::process::Child> {
    let exe = std::env::current_exe().context("Failed to locate own executable")?;
    let mut cmd = tokio::process::Command::new(exe);
    cmd.arg("--never-listen");
    if let Some(path) = pid_file {
        cmd.arg("--pid-file").arg(path);
    }

    let child = cmd.spawn().context("Failed to spawn worker")?;
    info!("Spawned worker (PID: {})", child.id().unwrap_or_default());
    Ok(child)
}

fn write_pid_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, std::process::id().to_string())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        }
    }

    #[cfg(windows)]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
    }
}
