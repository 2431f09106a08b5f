//! # Suite Readiness
//!
//! Readiness probing for the server under test.
//!
//! The prober polls an HTTP URL on a fixed interval instead of parsing the
//! server's output, so it works whatever the server logs and whichever order
//! it binds its port and finishes initialising in.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use suite_readiness::{ProbeConfig, ReadinessProber};
//!
//! # async fn example() -> Result<(), suite_readiness::ReadinessError> {
//! let prober = ReadinessProber::new(
//!     ProbeConfig::new("http://127.0.0.1:5000/")
//!         .with_max_attempts(30)
//!         .with_interval(Duration::from_secs(1)),
//! );
//! let attempt = prober.wait_until_ready().await?;
//! println!("ready after {} attempts", attempt);
//! # Ok(())
//! # }
//! ```

pub mod http;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub use http::{check_http_ready, parse_probe_uri};

/// Readiness error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    #[error("Server at {url} not ready after {attempts} attempts")]
    StartupTimeout { url: String, attempts: u32 },

    #[error("Invalid readiness URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for readiness operations.
pub type ReadinessResult<T> = Result<T, ReadinessError>;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx response
    Ready { status: u16 },
    /// Any other response
    NotReady { status: u16 },
    /// Connection refused, reset, DNS failure...
    Unreachable { reason: String },
    /// No response within the request timeout
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProbeOutcome::Ready { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Ready { status } => write!(f, "ready ({})", status),
            ProbeOutcome::NotReady { status } => write!(f, "not ready ({})", status),
            ProbeOutcome::Unreachable { reason } => write!(f, "unreachable: {}", reason),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// One probe, consumed by the loop (and by an observer if one is set).
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    /// 1-based attempt number
    pub index: u32,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

/// Callback invoked after every attempt.
pub type AttemptObserver = Arc<dyn Fn(&ProbeAttempt) + Send + Sync>;

/// Prober configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub url: String,
    pub max_attempts: u32,
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl ProbeConfig {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            interval: Self::DEFAULT_INTERVAL,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Worst-case time spent before `StartupTimeout`, ignoring request time.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Polls a URL until it answers 2xx or the attempt budget runs out.
#[derive(Clone)]
pub struct ReadinessProber {
    config: ProbeConfig,
    observer: Option<AttemptObserver>,
}

impl ReadinessProber {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Set a callback that sees every attempt.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ProbeAttempt) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Wait until the URL answers 2xx.
    ///
    /// Returns the 1-based index of the successful attempt. Every failed
    /// attempt, the last one included, is followed by one `interval` sleep.
    pub async fn wait_until_ready(&self) -> ReadinessResult<u32> {
        self.wait_until_ready_while(|| true).await
    }

    /// Like [`wait_until_ready`](Self::wait_until_ready), but gives up early
    /// once `keep_probing` returns false (checked after each failed attempt).
    pub async fn wait_until_ready_while<F>(&self, mut keep_probing: F) -> ReadinessResult<u32>
    where
        F: FnMut() -> bool,
    {
        let uri = parse_probe_uri(&self.config.url)?;
        let mut attempts = 0;

        info!(
            "Waiting for {} (max {} attempts, interval {:?})",
            self.config.url, self.config.max_attempts, self.config.interval
        );

        for index in 1..=self.config.max_attempts {
            attempts = index;
            let started = Instant::now();
            let outcome = check_http_ready(&uri, self.config.request_timeout).await;
            let attempt = ProbeAttempt {
                index,
                outcome,
                elapsed: started.elapsed(),
            };

            if let Some(ref observer) = self.observer {
                observer(&attempt);
            }

            if attempt.outcome.is_ready() {
                info!(
                    "{} is ready after {} attempt(s)",
                    self.config.url, index
                );
                return Ok(index);
            }

            debug!(
                "Readiness attempt {}/{} for {}: {}",
                index, self.config.max_attempts, self.config.url, attempt.outcome
            );

            sleep(self.config.interval).await;

            if !keep_probing() {
                warn!(
                    "Stopped probing {} after {} attempt(s)",
                    self.config.url, index
                );
                break;
            }
        }

        Err(ReadinessError::StartupTimeout {
            url: self.config.url.clone(),
            attempts,
        })
    }
}

impl fmt::Debug for ReadinessProber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessProber")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
