use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use suite_common::{Endpoint, DEFAULT_HOST, DEFAULT_PORT};

pub mod validation;

/// Configuration of the supervised server.
///
/// Every field has a default, so an empty document (or no file at all)
/// yields the fixed `python todo.py` on `127.0.0.1:5000` setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Label used in log prefixes
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Program run through the platform shell
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    /// Extra variables on top of the inherited environment
    #[serde(default)]
    pub environment: HashMap<String, String>,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// How readiness is probed after launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_path")]
    pub path: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_interval", with = "duration_serde")]
    pub interval: Duration,

    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Stop probing as soon as the server process has exited
    #[serde(default)]
    pub abort_on_exit: bool,
}

/// Where the server's output goes besides the tracing log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            host: default_host(),
            port: default_port(),
            command: default_command(),
            args: default_args(),
            working_directory: None,
            environment: HashMap::new(),
            readiness: ReadinessConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            path: default_readiness_path(),
            max_attempts: default_max_attempts(),
            interval: default_interval(),
            request_timeout: default_request_timeout(),
            abort_on_exit: false,
        }
    }
}

impl SupervisorConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        // serde_yaml maps an empty document to unit, not to an empty mapping
        let config: SupervisorConfig = if content.trim().is_empty() {
            SupervisorConfig::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// URL the readiness prober polls.
    pub fn readiness_url(&self) -> String {
        self.endpoint().url(&self.readiness.path)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.command = command.into();
        self.args = args;
        self
    }

    pub fn with_readiness(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.readiness.max_attempts = max_attempts;
        self.readiness.interval = interval;
        self
    }
}

fn default_name() -> String {
    "server".to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_command() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec!["todo.py".to_string()]
}

fn default_readiness_path() -> String {
    "/".to_string()
}

fn default_max_attempts() -> u32 {
    30
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(1)
}

// Durations are written as "500ms", "1s" or "2m"
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        // "ms" must be checked before "s"
        if let Some(num_str) = s.strip_suffix("ms") {
            let millis: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if let Some(num_str) = s.strip_suffix('s') {
            let secs: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else if let Some(num_str) = s.strip_suffix('m') {
            let mins: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(mins * 60))
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}
