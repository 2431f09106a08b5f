//! Value types shared by the supervisor and the lifecycle hooks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Host the subordinate server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the subordinate server binds to.
pub const DEFAULT_PORT: u16 = 5000;

/// Network location of the subordinate server.
///
/// # Example
/// ```
/// use suite_common::Endpoint;
///
/// let endpoint = Endpoint::default();
/// assert_eq!(endpoint.base_url(), "http://127.0.0.1:5000");
/// assert_eq!(endpoint.url("/todos"), "http://127.0.0.1:5000/todos");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Loopback endpoint on the given port.
    pub fn local(port: u16) -> Self {
        Self::new(DEFAULT_HOST, port)
    }

    /// `http://host:port` without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Joins `path` onto the base URL. A missing leading slash is added.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::local(DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Identifier of one test run. Scopes the run context so that two runs in
/// the same process never see each other's supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Run id derived from the current process id, wall clock and a
    /// per-process sequence number.
    pub fn generate() -> Self {
        static SEQUENCE: AtomicU64 = AtomicU64::new(0);

        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("run-{}-{}-{}", std::process::id(), millis, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
