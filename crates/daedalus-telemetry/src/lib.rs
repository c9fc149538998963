//! Observability for Daedalus.
//!
//! - **Logger**: a hierarchical, leveled, structured logging handle injected
//!   into the validation resolvers and the hook pipeline
//! - **Logging**: `tracing-subscriber` setup with JSON or pretty output
//! - **Metrics**: request counters and latency histograms via `metrics`
//!
//! # Example
//!
//! ```rust,ignore
//! use daedalus_telemetry::{init_logging, LogConfig, Logger};
//!
//! init_logging(&LogConfig::production())?;
//!
//! let logger = Logger::new("orders-api");
//! logger.child("startup").info("listening", serde_json::json!({ "port": 8080 }));
//! ```

pub mod error;
pub mod logger;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logger::{serialize_error, LogCapture, LogLevel, LogRecord, Logger};
pub use logging::{fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
