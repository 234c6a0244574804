//! Process launch settings: workers, bind address, timeouts and log sinks.
//!
//! Read once at startup from `LAUNCH_`-prefixed environment variables and
//! never mutated afterwards.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Prefix of the launch environment variables.
pub const ENV_PREFIX: &str = "LAUNCH_";

/// Log sink value meaning "standard error" instead of a file.
pub const STDERR_SINK: &str = "-";

/// Launch settings for the web service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Log level (trace, debug, info, warning, error, critical).
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// General (error) log sink: a file path or `-`.
    #[serde(default = "default_errorlog")]
    pub errorlog: String,

    /// Access log sink: a file path or `-`.
    #[serde(default = "default_accesslog")]
    pub accesslog: String,

    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Worker thread count.
    #[serde(default = "default_workers_from_host")]
    pub workers: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Keep-alive idle timeout advertised to clients, in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive: u64,

    /// Capture general output into the error log instead of the console.
    #[serde(default = "default_true")]
    pub capture_output: bool,
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_errorlog() -> String {
    "/var/log/hit-counter-error.log".to_string()
}

fn default_accesslog() -> String {
    "/var/log/hit-counter-access.log".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_timeout() -> u64 {
    3 * 60 // 3 minutes
}

fn default_keepalive() -> u64 {
    24 * 60 * 60 // 1 day
}

fn default_true() -> bool {
    true
}

fn default_workers_from_host() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    default_workers(cpus)
}

/// Worker count heuristic: two per CPU plus one, to overlap I/O wait.
pub fn default_workers(cpus: usize) -> usize {
    cpus * 2 + 1
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            loglevel: default_loglevel(),
            errorlog: default_errorlog(),
            accesslog: default_accesslog(),
            bind: default_bind(),
            workers: default_workers_from_host(),
            timeout: default_timeout(),
            keepalive: default_keepalive(),
            capture_output: default_true(),
        }
    }
}

impl LaunchConfig {
    /// Load launch settings from environment, reading .env file first.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build launch settings from `(NAME, value)` pairs; only `LAUNCH_`
    /// names are read.
    pub fn from_vars<I>(vars: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    /// Check if the launch settings are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("LAUNCH_WORKERS must be at least 1".to_string());
        }

        if self.timeout == 0 {
            return Err("LAUNCH_TIMEOUT must be at least 1 second".to_string());
        }

        self.bind_addr()?;
        self.level_filter()?;

        Ok(())
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        self.bind
            .parse()
            .map_err(|e| format!("LAUNCH_BIND {:?} is not a socket address: {}", self.bind, e))
    }

    /// Log level as a tracing filter. Accepts the process-manager spellings
    /// `warning` and `critical` too.
    pub fn level_filter(&self) -> Result<LevelFilter, String> {
        match self.loglevel.to_lowercase().as_str() {
            "trace" => Ok(LevelFilter::TRACE),
            "debug" => Ok(LevelFilter::DEBUG),
            "info" => Ok(LevelFilter::INFO),
            "warn" | "warning" => Ok(LevelFilter::WARN),
            "error" | "critical" => Ok(LevelFilter::ERROR),
            other => Err(format!("LAUNCH_LOGLEVEL {:?} is not a log level", other)),
        }
    }

    /// Per-request deadline.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Keep-alive idle timeout.
    pub fn keepalive_duration(&self) -> Duration {
        Duration::from_secs(self.keepalive)
    }
}
