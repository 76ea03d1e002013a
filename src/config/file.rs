//! Config file format.
//!
//! ```toml
//! [haproxy-statsd]
//! haproxy_url = "http://127.0.0.1:1936/;csv"
//! haproxy_user = ""
//! haproxy_password = ""
//! statsd_host = "127.0.0.1"
//! statsd_port = 8125
//! statsd_namespace = "haproxy.(HOSTNAME)"
//! interval = 5
//! ```

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(rename = "haproxy-statsd", default)]
    pub section: FileSection,
}

/// The `[haproxy-statsd]` table. Absent keys leave lower layers untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileSection {
    pub haproxy_url: Option<String>,
    pub haproxy_user: Option<String>,
    pub haproxy_password: Option<String>,
    /// Scrape request timeout in seconds.
    pub haproxy_timeout: Option<f64>,
    pub statsd_host: Option<String>,
    pub statsd_port: Option<u16>,
    pub statsd_namespace: Option<String>,
    /// Seconds between cycles, fractions allowed.
    pub interval: Option<f64>,
    /// Self-telemetry exporter port, 0 to disable.
    pub metrics_port: Option<u16>,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
