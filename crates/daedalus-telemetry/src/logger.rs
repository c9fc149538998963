//! Hierarchical, leveled, structured logger handle.
//!
//! A [`Logger`] is a cheap, cloneable name scope over `tracing`. Framework
//! components receive one by injection and log through it, so every event
//! carries the `logger` name it came from and an optional JSON `meta` payload.
//!
//! ```rust
//! use daedalus_telemetry::Logger;
//! use serde_json::json;
//!
//! let logger = Logger::new("daedalus").child("pipeline");
//! assert_eq!(logger.name(), "daedalus.pipeline");
//! logger.warn("response validation failed", json!({ "status": 200 }));
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that did not fail the request.
    Warn,
    /// A failure.
    Error,
    /// A failure that leaves the process unable to continue.
    Fatal,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        })
    }
}

/// A log event retained by a capturing logger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Event severity.
    pub level: LogLevel,
    /// Dotted logger name.
    pub logger: String,
    /// Human-readable message.
    pub message: String,
    /// Structured metadata (`Null` when none was attached).
    pub meta: Value,
}

/// Events recorded by [`Logger::capturing`].
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    /// Returns a snapshot of all captured events.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns captured events at `level`.
    #[must_use]
    pub fn at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Returns `true` if any event message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.message.contains(needle))
    }
}

/// A named logging scope.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    capture: Option<LogCapture>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("capturing", &self.capture.is_some())
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("daedalus")
    }
}

impl Logger {
    /// Creates a root logger.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            capture: None,
        }
    }

    /// Creates a root logger that also records every event in memory.
    ///
    /// Events still go to `tracing`.
    pub fn capturing(name: impl AsRef<str>) -> (Self, LogCapture) {
        let capture = LogCapture::default();
        let logger = Self {
            name: Arc::from(name.as_ref()),
            capture: Some(capture.clone()),
        };
        (logger, capture)
    }

    /// Creates a child scope; names are joined with `.`.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self {
            name: Arc::from(format!("{}.{name}", self.name)),
            capture: self.capture.clone(),
        }
    }

    /// The dotted name of this scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logs at debug level.
    pub fn debug(&self, message: &str, meta: Value) {
        self.log(LogLevel::Debug, message, meta);
    }

    /// Logs at info level.
    pub fn info(&self, message: &str, meta: Value) {
        self.log(LogLevel::Info, message, meta);
    }

    /// Logs at warn level.
    pub fn warn(&self, message: &str, meta: Value) {
        self.log(LogLevel::Warn, message, meta);
    }

    /// Logs at error level.
    pub fn error(&self, message: &str, meta: Value) {
        self.log(LogLevel::Error, message, meta);
    }

    /// Logs a fatal event. `tracing` has no fatal level, so the event is
    /// emitted at ERROR with `fatal = true`.
    pub fn fatal(&self, message: &str, meta: Value) {
        self.log(LogLevel::Fatal, message, meta);
    }

    /// Logs at an explicit level.
    pub fn log(&self, level: LogLevel, message: &str, meta: Value) {
        let rendered = if meta.is_null() {
            None
        } else {
            Some(meta.to_string())
        };
        let logger = &*self.name;
        let meta_field = rendered.as_deref();

        match level {
            LogLevel::Debug => tracing::debug!(logger, meta = meta_field, "{message}"),
            LogLevel::Info => tracing::info!(logger, meta = meta_field, "{message}"),
            LogLevel::Warn => tracing::warn!(logger, meta = meta_field, "{message}"),
            LogLevel::Error => tracing::error!(logger, meta = meta_field, "{message}"),
            LogLevel::Fatal => {
                tracing::error!(logger, meta = meta_field, fatal = true, "{message}");
            }
        }

        if let Some(capture) = &self.capture {
            capture.records.lock().push(LogRecord {
                level,
                logger: logger.to_string(),
                message: message.to_string(),
                meta,
            });
        }
    }
}

/// Serializes an error and its source chain for structured logs.
///
/// ```rust
/// use daedalus_telemetry::serialize_error;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// let value = serialize_error(&err);
/// assert_eq!(value["message"], "disk full");
/// ```
pub fn serialize_error(error: &(dyn StdError + 'static)) -> Value {
    let mut chain = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    json!({
        "message": error.to_string(),
        "chain": chain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer failure")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_child_names_are_dotted() {
        let logger = Logger::new("app").child("routes").child("users");
        assert_eq!(logger.name(), "app.routes.users");
    }

    #[test]
    fn test_capture_is_shared_with_children() {
        let (root, capture) = Logger::capturing("app");
        root.child("hooks").error("hook failed", json!({ "index": 2 }));
        root.info("started", Value::Null);

        let records = capture.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].logger, "app.hooks");
        assert_eq!(records[0].meta["index"], 2);
        assert_eq!(capture.at(LogLevel::Info).len(), 1);
        assert!(capture.contains("hook failed"));
    }

    #[test]
    fn test_fatal_is_recorded_as_fatal() {
        let (root, capture) = Logger::capturing("app");
        root.fatal("cannot continue", Value::Null);
        assert_eq!(capture.at(LogLevel::Fatal).len(), 1);
    }

    #[test]
    fn test_serialize_error_chain() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "inner"));
        let value = serialize_error(&err);
        assert_eq!(value["message"], "outer failure");
        assert_eq!(value["chain"], json!(["inner"]));
    }
}
