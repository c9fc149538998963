//! Route registration errors.

use http::Method;
use thiserror::Error;

/// Errors raised while inserting a route into the [`Router`](crate::Router).
///
/// These are programming mistakes detected at registration time; a running
/// router never produces them.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path template could not be parsed.
    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A `:name{pattern}` constraint is not a valid regular expression.
    #[error("invalid constraint for parameter '{param}' in '{template}': {source}")]
    InvalidConstraint {
        /// The offending template.
        template: String,
        /// The constrained parameter.
        param: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// The same method is already registered for an equivalent path.
    #[error("route conflict: {method} {template} is already registered")]
    Conflict {
        /// Conflicting method, or `*` for an any-method registration.
        method: String,
        /// The template being inserted.
        template: String,
    },
}

impl RouteError {
    pub(crate) fn invalid(template: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(method: Option<&Method>, template: &str) -> Self {
        Self::Conflict {
            method: method.map_or_else(|| "*".to_string(), ToString::to_string),
            template: template.to_string(),
        }
    }
}
