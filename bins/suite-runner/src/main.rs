use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{error, info, warn};

use suite_lifecycle::{RunContext, SuiteHooks, SupervisorHooks};
use suite_supervisor::SupervisorConfig;

/// Runs a test command against a freshly started server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML). Built-in defaults apply without one.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Port of the server under test (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server command (overrides config, clears configured args)
    #[arg(long, value_name = "CMD")]
    server_command: Option<String>,

    /// Argument for --server-command, repeatable
    #[arg(long = "server-arg", value_name = "ARG", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Environment variable through which the test command receives the base URL
    #[arg(long, default_value = "TODO_BASE_URL")]
    base_url_env: String,

    /// Test command; without one the server runs until a shutdown signal
    #[arg(last = true, value_name = "TEST_COMMAND")]
    test_command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug)?;

    let config = load_config(&args)?;
    info!(
        "Server under test: {} {} on port {}",
        config.command,
        config.args.join(" "),
        config.port
    );

    let mut hooks = SupervisorHooks::new(config);
    let code = run_suite(&mut hooks, &args).await?;

    info!("Test command finished with exit code {}", code);
    std::process::exit(code);
}

fn load_config(args: &Args) -> Result<SupervisorConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Config file: {}", path.display());
            SupervisorConfig::load_from_file(path)?
        }
        None => SupervisorConfig::default(),
    };

    if let Some(port) = args.port {
        config.port = port;
    }

    if let Some(ref command) = args.server_command {
        config.command = command.clone();
        config.args = args.server_args.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Setup, run the test command (or wait for a signal), teardown.
/// Teardown runs on every path once setup succeeded.
async fn run_suite<H: SuiteHooks>(hooks: &mut H, args: &Args) -> Result<i32> {
    let mut ctx = RunContext::new();
    info!("Run {}", ctx.run_id());

    if let Err(e) = hooks.setup(&mut ctx).await {
        error!("Global setup failed: {}", e);
        hooks.teardown(&mut ctx).await;
        return Err(anyhow!("Global setup failed: {}", e));
    }

    let base_url = ctx
        .base_url()
        .ok_or_else(|| anyhow!("Setup finished without a server"))?;

    let code = if args.test_command.is_empty() {
        info!("Server ready at {}; waiting for shutdown signal", base_url);
        setup_signal_handlers().await;
        0
    } else {
        tokio::select! {
            result = run_test_command(&args.test_command, &args.base_url_env, &base_url) => {
                match result {
                    Ok(code) => code,
                    Err(e) => {
                        error!("{:#}", e);
                        1
                    }
                }
            }
            _ = setup_signal_handlers() => {
                warn!("Interrupted, tearing down");
                130
            }
        }
    };

    hooks.teardown(&mut ctx).await;
    Ok(code)
}

async fn run_test_command(command: &[String], base_url_env: &str, base_url: &str) -> Result<i32> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| anyhow!("Empty test command"))?;

    info!("Running test command: {}", command.join(" "));
    let status = tokio::process::Command::new(program)
        .args(rest)
        .env(base_url_env, base_url)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
        .with_context(|| format!("Failed to run test command '{}'", program))?;

    Ok(status.code().unwrap_or(1))
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    Ok(())
}

async fn setup_signal_handlers() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let (mut sigterm, mut sigint) = match (
            signal::unix::signal(signal::unix::SignalKind::terminate()),
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            _ => {
                error!("Failed to create signal handlers");
                std::future::pending::<()>().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
