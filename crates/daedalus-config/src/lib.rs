//! # Daedalus Config
//!
//! Typed, layered configuration for Daedalus applications:
//! - TOML and JSON configuration files
//! - `PREFIX__SECTION__KEY` environment overrides and `.env` files
//! - strict parsing that fails on unknown fields
//!
//! ```
//! use daedalus_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_string("[validation]\nresponse = false", "toml")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! assert!(config.validation.request);
//! assert!(!config.validation.response);
//! ```
//!
//! ## File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! keep_alive_secs = 75
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [validation]
//! request = true
//! response = true
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::DaedalusConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingConfig, ServerSection, ValidationConfig};
