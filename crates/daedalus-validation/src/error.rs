//! Validation failure and configuration error types.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::provider::ProviderId;

/// Which side of the exchange a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Request schema.
    Request,
    /// Response schema.
    Response,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
        })
    }
}

/// A programming mistake detected while composing a route.
///
/// Configuration errors are returned from route registration and never
/// reach hooks or failure handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The validator and the schema belong to different providers.
    #[error("{target} schema uses provider '{schema}' but the validator expects '{validator}'")]
    ProviderMismatch {
        /// Which schema was rejected.
        target: Target,
        /// Provider of the validator.
        validator: ProviderId,
        /// Provider of the schema.
        schema: ProviderId,
    },

    /// A response status pattern could not be parsed.
    #[error("invalid status pattern '{pattern}': expected a status code, a class like '2XX', or 'default'")]
    InvalidStatusPattern {
        /// The rejected pattern.
        pattern: String,
    },

    /// A content map was declared without any media type.
    #[error("{target} body declares an empty content map")]
    EmptyContentMap {
        /// Which schema was rejected.
        target: Target,
    },
}

/// Validation stage of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Detected before any schema ran.
    PreValidation,
    /// A schema rejected the value.
    Validation,
}

impl Stage {
    /// The stage name used in logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreValidation => "pre-validation",
            Self::Validation => "validation",
        }
    }
}

/// A single problem reported by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Location of the problem, e.g. `$.items[0].qty`.
    pub path: String,
    /// What is wrong.
    pub message: String,
    /// Optional machine-readable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Issue {
    /// Creates an issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            code: None,
        }
    }

    /// Sets the machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// A validator's refusal of a value.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct Rejection {
    /// Summary.
    pub message: String,
    /// Individual problems, possibly empty.
    pub issues: Vec<Issue>,
}

impl Rejection {
    /// A rejection without issues.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// A rejection summarising `issues`.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let message = match issues.as_slice() {
            [only] => format!("{}: {}", only.path, only.message),
            many => format!("{} validation issues", many.len()),
        };
        Self { message, issues }
    }
}

/// A structural problem found before a schema could run.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreValidationError {
    /// No schema is declared for the message's media type.
    #[error("unsupported media type '{}'", .requested.as_deref().unwrap_or("(none)"))]
    UnsupportedMediaType {
        /// Declared media types, in declaration order.
        supported: Vec<String>,
        /// The media type of the message, if it had one.
        requested: Option<String>,
    },

    /// The payload is not valid JSON.
    #[error("invalid JSON payload: {cause}")]
    InvalidJson {
        /// Parser error.
        cause: String,
    },

    /// The payload could not be read or decoded.
    #[error("unreadable body: {cause}")]
    InvalidBody {
        /// Underlying error.
        cause: String,
    },
}

impl PreValidationError {
    /// Machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::InvalidJson { .. } => "INVALID_JSON",
            Self::InvalidBody { .. } => "INVALID_BODY",
        }
    }
}

/// Rejections collected per request field. Only failed fields are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldFailures {
    /// Path parameter rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Rejection>,
    /// Query rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<Rejection>,
    /// Header rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Rejection>,
    /// Body rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Rejection>,
}

impl FieldFailures {
    /// Returns `true` when no field failed.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Names of the failed fields.
    pub fn fields(&self) -> Vec<&'static str> {
        [
            ("params", self.params.is_some()),
            ("queries", self.queries.is_some()),
            ("headers", self.headers.is_some()),
            ("body", self.body.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, failed)| failed.then_some(name))
        .collect()
    }
}

/// Why a request failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    /// The body could not be obtained. Reported alone, even if other
    /// fields failed too.
    #[error(transparent)]
    PreValidation(#[from] PreValidationError),

    /// One or more fields were rejected.
    #[error("request validation failed for {}", .0.fields().join(", "))]
    Validation(FieldFailures),
}

impl RequestValidationError {
    /// The failure stage.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::PreValidation(_) => Stage::PreValidation,
            Self::Validation(_) => Stage::Validation,
        }
    }

    /// Structured form for logs.
    pub fn to_value(&self) -> Value {
        match self {
            Self::PreValidation(err) => json!({
                "stage": self.stage(),
                "message": err.to_string(),
                "reason": err,
            }),
            Self::Validation(failures) => json!({
                "stage": self.stage(),
                "message": self.to_string(),
                "fields": failures,
            }),
        }
    }
}

/// Why a response failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseValidationError {
    /// No entry matches the status, and there is no `default` entry.
    #[error("no response schema for status code {status}")]
    NoSchemaForStatusCode {
        /// The response status.
        status: u16,
    },

    /// The response body could not be obtained.
    #[error(transparent)]
    PreValidation(#[from] PreValidationError),

    /// The body was rejected.
    #[error("response body rejected: {0}")]
    Validation(Rejection),
}

impl ResponseValidationError {
    /// Machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoSchemaForStatusCode { .. } => "NO_SCHEMA_FOR_STATUS_CODE",
            Self::PreValidation(err) => err.code(),
            Self::Validation(_) => "VALIDATION_FAILED",
        }
    }

    /// The failure stage.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::NoSchemaForStatusCode { .. } | Self::PreValidation(_) => Stage::PreValidation,
            Self::Validation(_) => Stage::Validation,
        }
    }

    /// Structured form for logs.
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "stage": self.stage(),
            "code": self.code(),
            "message": self.to_string(),
        });
        match self {
            Self::NoSchemaForStatusCode { status } => value["status"] = json!(status),
            Self::PreValidation(err) => value["reason"] = json!(err),
            Self::Validation(rejection) => value["issues"] = json!(rejection.issues),
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_fields_only() {
        let failures = FieldFailures {
            headers: Some(Rejection::new("missing x-api-key")),
            ..FieldFailures::default()
        };
        assert_eq!(failures.fields(), vec!["headers"]);
        let value = serde_json::to_value(&failures).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert!(value.get("headers").is_some());
    }

    #[test]
    fn test_pre_validation_serializes_with_code() {
        let err = PreValidationError::UnsupportedMediaType {
            supported: vec!["application/json".into()],
            requested: Some("application/xml".into()),
        };
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "UNSUPPORTED_MEDIA_TYPE");
        assert_eq!(value["requested"], "application/xml");
        assert_eq!(err.code(), "UNSUPPORTED_MEDIA_TYPE");
    }

    #[test]
    fn test_rejection_message_from_issues() {
        let one = Rejection::from_issues(vec![Issue::new("$.name", "is required")]);
        assert_eq!(one.message, "$.name: is required");
        let two = Rejection::from_issues(vec![Issue::new("$.a", "x"), Issue::new("$.b", "y")]);
        assert_eq!(two.message, "2 validation issues");
    }

    #[test]
    fn test_stage_names() {
        let err = RequestValidationError::from(PreValidationError::InvalidJson {
            cause: "EOF".into(),
        });
        assert_eq!(err.stage().as_str(), "pre-validation");
        assert_eq!(err.to_value()["stage"], "pre-validation");
        assert_eq!(err.to_value()["reason"]["code"], "INVALID_JSON");
    }
}
