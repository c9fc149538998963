//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, ServerSection, ValidationConfig};

/// Complete Daedalus application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// ```
/// use daedalus_config::DaedalusConfig;
///
/// let config = DaedalusConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validation.request);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DaedalusConfig {
    /// Server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Validation switches.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl DaedalusConfig {
    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Fails when the bind address is not a socket address, the log level is
    /// empty, or the logger name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_connections == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.max_connections",
                "must be greater than zero",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        if self.logging.logger_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.logger_name",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs on localhost.
    ///
    /// ```
    /// use daedalus_config::{DaedalusConfig, LogFormat};
    ///
    /// let config = DaedalusConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..ServerSection::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                span_events: true,
                file_line_info: true,
                ..LoggingConfig::default()
            },
            validation: ValidationConfig::default(),
        }
    }

    /// Production preset: JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerSection::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
                ..LoggingConfig::default()
            },
            validation: ValidationConfig::default(),
        }
    }
}
