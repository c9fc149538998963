//! Server and application setup errors.

use thiserror::Error;

use daedalus_router::RouteError;
use daedalus_validation::ConfigurationError;

/// Errors raised while registering routes.
///
/// All of them are programming or configuration mistakes and surface at
/// setup time, never while serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// The path template is invalid or conflicts with an existing route.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The route's schemas cannot be used with the application validator.
    #[error("route `{template}`: {source}")]
    Configuration {
        /// The offending template.
        template: String,
        /// What is wrong with the validation setup.
        #[source]
        source: ConfigurationError,
    },
}

/// Errors raised while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind to the configured address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
