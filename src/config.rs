use config::{self, File};
use log::{debug, error};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ReporterError, Result};
use crate::reconnect::ReconnectPolicy;

/// Collector channel configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Collector address, e.g. "collector.example.net:443". Transport
    /// encryption is always on; a plaintext scheme is rejected at setup.
    pub address: String,
    /// Bearer token attached to every call, if set
    #[serde(default)]
    pub access_token: Option<String>,
    /// Path to a locally trusted certificate file. Checked for existence
    /// once, at channel construction; a missing file falls back to the
    /// platform trust store.
    #[serde(default)]
    pub trust_cert: Option<PathBuf>,
    /// HTTP/2 keepalive probe interval while idle, in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,
    /// HTTP/2 keepalive timeout, in seconds
    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout_secs: u64,
    /// Identity stamped on every report so the collector can attribute it
    #[serde(default = "default_reporter_id")]
    pub reporter_id: String,
}

/// Reporting schedule configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReportingConfig {
    /// Sample period in seconds; the first sample fires one full period
    /// after the stream opens
    #[serde(default = "default_sample_period")]
    pub sample_period_secs: u64,
    /// Delay before retrying stream establishment after a transport fault
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    /// Add a small random jitter to the reconnect delay
    #[serde(default)]
    pub reconnect_jitter: bool,
    /// Idle probe interval in seconds: a keepalive-flagged empty report is
    /// pushed when a full interval passes with no outbound frame
    #[serde(default = "default_keepalive_probe")]
    pub keepalive_probe_secs: u64,
    /// Outbound frame buffer size; a full buffer drops the frame (reports
    /// are last-value snapshots, the next sample supersedes it)
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            sample_period_secs: default_sample_period(),
            reconnect_delay_secs: default_reconnect_delay(),
            reconnect_jitter: false,
            keepalive_probe_secs: default_keepalive_probe(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl ReportingConfig {
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs(self.sample_period_secs)
    }

    pub fn keepalive_probe(&self) -> Duration {
        Duration::from_secs(self.keepalive_probe_secs)
    }

    /// Build the reconnect policy this schedule implies: fixed delay,
    /// jitter only if asked for.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(self.reconnect_delay_secs));
        if self.reconnect_jitter {
            policy.with_jitter()
        } else {
            policy
        }
    }
}

/// Top-level agent configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UplinkConfig {
    /// Collector channel configuration
    pub collector: CollectorConfig,
    /// Reporting schedule
    #[serde(default)]
    pub reporting: ReportingConfig,
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_sample_period() -> u64 {
    5
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_keepalive_interval() -> u64 {
    50
}

fn default_keepalive_timeout() -> u64 {
    60
}

fn default_keepalive_probe() -> u64 {
    50
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_reporter_id() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "uplink".to_string())
}

/// Logging level
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Load agent configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<UplinkConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());

    // Check if the file exists
    if !path.exists() {
        error!("Configuration file {} does not exist", path.display());
        return Err(ReporterError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    // Get the file extension
    let extension = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => {
            error!("Configuration file has no extension");
            return Err(ReporterError::Config(format!(
                "Configuration file has no extension: {}",
                path.display()
            )));
        }
    };

    // Check if the extension is supported and create the appropriate FileFormat
    let format = match extension.as_str() {
        "toml" => config::FileFormat::Toml,
        "json" => config::FileFormat::Json,
        "yaml" | "yml" => config::FileFormat::Yaml,
        format => {
            error!("Unsupported configuration format: {}", format);
            return Err(ReporterError::Config(format!(
                "Unsupported config format: {}",
                format
            )));
        }
    };

    // Build configuration
    let config = config::Config::builder()
        .add_source(File::with_name(&path.to_string_lossy()).format(format))
        .build()
        .map_err(|e| ReporterError::Config(e.to_string()))?;

    // Deserialize configuration
    config
        .try_deserialize()
        .map_err(|e| ReporterError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_from_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            log_level = "debug"

            [collector]
            address = "collector.example.net:443"
            access_token = "secret"
            reporter_id = "gw-1"

            [reporting]
            sample_period_secs = 2
            reconnect_jitter = true
        "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.collector.address, "collector.example.net:443");
        assert_eq!(config.collector.access_token.as_deref(), Some("secret"));
        assert_eq!(config.collector.reporter_id, "gw-1");
        assert_eq!(config.reporting.sample_period_secs, 2);
        assert!(config.reporting.reconnect_jitter);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_defaults_fill_in() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [collector]
            address = "collector.example.net:443"
        "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.reporting.sample_period_secs, 5);
        assert_eq!(config.reporting.reconnect_delay_secs, 5);
        assert_eq!(config.collector.keepalive_interval_secs, 50);
        assert_eq!(config.collector.keepalive_timeout_secs, 60);
        assert_eq!(config.reporting.keepalive_probe_secs, 50);
        assert!(!config.reporting.reconnect_jitter);
        assert!(config.collector.trust_cert.is_none());
        assert!(!config.collector.reporter_id.is_empty());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_load_from_json_file() {
        let doc = serde_json::json!({
            "collector": {
                "address": "collector.example.net:443",
                "keepalive_interval_secs": 25
            },
            "log_level": "warn"
        });

        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", doc).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.collector.keepalive_interval_secs, 25);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config("/nonexistent/uplink.toml").unwrap_err();
        assert!(matches!(err, ReporterError::Config(_)));
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let mut file = Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "address = x").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ReporterError::Config(_)));
    }
}
