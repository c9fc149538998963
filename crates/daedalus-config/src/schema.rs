//! Configuration section types.

use serde::{Deserialize, Serialize};

use daedalus_telemetry::LogConfig;

/// Server section.
///
/// ```
/// use daedalus_config::ServerSection;
///
/// let server = ServerSection {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(server.shutdown_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Keep-alive timeout in seconds. None disables keep-alive.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: Option<u64>,

    /// Maximum number of concurrent connections. None means unlimited.
    #[serde(default)]
    pub max_connections: Option<usize>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            keep_alive_secs: default_keep_alive(),
            max_connections: None,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

#[allow(clippy::unnecessary_wraps)]
fn default_keep_alive() -> Option<u64> {
    Some(75)
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. "info" or "daedalus=debug,hyper=warn".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_line_info: bool,

    /// Name of the root application logger.
    #[serde(default = "default_logger_name")]
    pub logger_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            logger_name: default_logger_name(),
        }
    }
}

impl LoggingConfig {
    /// Converts into the subscriber settings of `daedalus-telemetry`.
    ///
    /// ```
    /// use daedalus_config::{LogFormat, LoggingConfig};
    ///
    /// let section = LoggingConfig {
    ///     level: "debug".to_string(),
    ///     format: LogFormat::Pretty,
    ///     ..Default::default()
    /// };
    /// let log = section.to_log_config();
    /// assert_eq!(log.level, "debug");
    /// assert!(!log.json_format);
    /// ```
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: self.span_events,
            file_line_info: self.file_line_info,
            include_target: true,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(section: &LoggingConfig) -> Self {
        section.to_log_config()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_logger_name() -> String {
    "daedalus".to_string()
}

/// Validation section.
///
/// Switching a side off disables that side for every route, whatever
/// schemas the routes declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Validate requests against route request schemas.
    #[serde(default = "default_true")]
    pub request: bool,

    /// Validate responses against route response schemas.
    #[serde(default = "default_true")]
    pub response: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            request: true,
            response: true,
        }
    }
}

fn default_true() -> bool {
    true
}
