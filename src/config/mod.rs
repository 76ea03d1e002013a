//! Runtime configuration.
//!
//! Configuration is resolved exactly once at startup, in three layers:
//!
//! ```text
//! built-in defaults → environment overrides → config file overrides
//! ```
//!
//! The result is an immutable [`Config`] that is handed to each component
//! explicitly. Nothing reads the environment after startup.

mod file;
mod namespace;

pub use file::{FileConfig, FileSection};
pub use namespace::{resolve_namespace, HOSTNAME_PLACEHOLDER};

use std::path::Path;
use std::time::Duration;

/// Configuration errors raised while resolving [`Config`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Where the stats report is scraped from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSource {
    /// Full URL of the CSV stats page, e.g. `http://127.0.0.1:1936/;csv`.
    pub url: String,
    /// Basic auth user. Empty means no credentials are sent.
    pub user: String,
    /// Basic auth password.
    pub password: String,
    /// Upper bound on a single scrape request.
    pub timeout: Duration,
}

impl ReportSource {
    /// Returns `(user, password)` when basic auth is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.user.is_empty() {
            None
        } else {
            Some((&self.user, &self.password))
        }
    }
}

/// Where metric datagrams are sent.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSink {
    /// statsd host name or address.
    pub host: String,
    /// statsd UDP port.
    pub port: u16,
    /// Namespace with any `(HOSTNAME)` placeholder already resolved.
    pub namespace: String,
}

impl MetricSink {
    /// Returns the `host:port` pair as a string suitable for socket resolution.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: ReportSource,
    pub sink: MetricSink,
    /// Delay between cycles in continuous mode.
    pub interval: Duration,
    /// Port of the self-telemetry exporter. 0 disables it.
    pub metrics_port: u16,
}

/// Unresolved settings, one field per configuration key.
///
/// Every layer writes into this struct; [`Settings::finish`] validates it
/// and produces a [`Config`].
#[derive(Debug, Clone)]
struct Settings {
    haproxy_url: String,
    haproxy_user: String,
    haproxy_password: String,
    haproxy_timeout: f64,
    statsd_host: String,
    statsd_port: String,
    statsd_namespace: String,
    interval: f64,
    metrics_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            haproxy_url: "http://127.0.0.1:1936/;csv".to_string(),
            haproxy_user: String::new(),
            haproxy_password: String::new(),
            haproxy_timeout: 10.0,
            statsd_host: "127.0.0.1".to_string(),
            statsd_port: "8125".to_string(),
            statsd_namespace: format!("haproxy.{}", HOSTNAME_PLACEHOLDER),
            interval: 5.0,
            metrics_port: 0,
        }
    }
}

impl Settings {
    fn apply_env<E>(&mut self, env: E)
    where
        E: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env("HAPROXY_HOST") {
            self.haproxy_url = v;
        }
        if let Some(v) = env("HAPROXY_USER") {
            self.haproxy_user = v;
        }
        if let Some(v) = env("HAPROXY_PASS") {
            self.haproxy_password = v;
        }
        if let Some(v) = env("STATSD_HOST") {
            self.statsd_host = v;
        }
        if let Some(v) = env("STATSD_PORT") {
            self.statsd_port = v;
        }
        if let Some(v) = env("STATSD_NAMESPACE") {
            self.statsd_namespace = v;
        }
    }

    fn apply_file(&mut self, file: FileSection) {
        if let Some(v) = file.haproxy_url {
            self.haproxy_url = v;
        }
        if let Some(v) = file.haproxy_user {
            self.haproxy_user = v;
        }
        if let Some(v) = file.haproxy_password {
            self.haproxy_password = v;
        }
        if let Some(v) = file.haproxy_timeout {
            self.haproxy_timeout = v;
        }
        if let Some(v) = file.statsd_host {
            self.statsd_host = v;
        }
        if let Some(v) = file.statsd_port {
            self.statsd_port = v.to_string();
        }
        if let Some(v) = file.statsd_namespace {
            self.statsd_namespace = v;
        }
        if let Some(v) = file.interval {
            self.interval = v;
        }
        if let Some(v) = file.metrics_port {
            self.metrics_port = v;
        }
    }

    fn finish(self, hostname: &str) -> Result<Config, ConfigError> {
        if self.haproxy_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "haproxy_url",
                reason: "must not be empty".to_string(),
            });
        }
        let port = self
            .statsd_port
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "statsd_port",
                reason: format!("{:?}: {}", self.statsd_port, e),
            })?;

        Ok(Config {
            source: ReportSource {
                url: self.haproxy_url,
                user: self.haproxy_user,
                password: self.haproxy_password,
                timeout: positive_seconds("haproxy_timeout", self.haproxy_timeout)?,
            },
            sink: MetricSink {
                host: self.statsd_host,
                port,
                namespace: resolve_namespace(&self.statsd_namespace, hostname),
            },
            interval: positive_seconds("interval", self.interval)?,
            metrics_port: self.metrics_port,
        })
    }
}

/// Longest accepted interval or timeout: one day.
const MAX_SECONDS: f64 = 86_400.0;

fn positive_seconds(key: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidValue {
            key,
            reason: format!("{} is not a positive number of seconds", secs),
        });
    }
    if secs > MAX_SECONDS {
        return Err(ConfigError::InvalidValue {
            key,
            reason: format!("{} seconds exceeds the {} second limit", secs, MAX_SECONDS),
        });
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

impl Config {
    /// Resolves configuration from the process environment and an optional
    /// TOML file.
    ///
    /// A missing file is not an error: defaults and environment apply.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = if path.exists() {
            Some(FileConfig::from_file(path)?)
        } else {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults and environment"
            );
            None
        };

        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        Self::resolve(|key| std::env::var(key).ok(), file, &hostname)
    }

    /// Resolves configuration from explicit inputs.
    ///
    /// `env` looks up an environment variable by name and `hostname`
    /// replaces the namespace placeholder.
    pub fn resolve<E>(env: E, file: Option<FileConfig>, hostname: &str) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        settings.apply_env(env);
        if let Some(file) = file {
            settings.apply_file(file.section);
        }
        settings.finish(hostname)
    }
}
