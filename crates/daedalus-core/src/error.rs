//! Framework error type.
//!
//! [`Error`] is what handlers and hooks return when something goes wrong.
//! Errors that reach the pipeline boundary unhandled are turned into a JSON
//! [`ErrorEnvelope`] response; internal errors never expose their message or
//! source chain to the client.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::{Body, BodyError};
use crate::Response;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or invalid input.
    BadRequest,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Permission denied.
    Forbidden,
    /// Resource not found.
    NotFound,
    /// Method not supported by the matched route.
    MethodNotAllowed,
    /// Conflict (e.g., concurrent modification).
    Conflict,
    /// Request body media type not accepted.
    UnsupportedMediaType,
    /// Rate limiting.
    RateLimited,
    /// Internal server errors.
    Internal,
    /// A dependency is unavailable.
    Unavailable,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the machine-readable code used in envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Conflict => "CONFLICT",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::RateLimited => "RATE_LIMITED",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Standard error type for handlers and hooks.
///
/// # Example
///
/// ```
/// use daedalus_core::{Error, ErrorCategory};
///
/// fn find_user(id: &str) -> Result<(), Error> {
///     Err(Error::not_found(format!("user '{id}' does not exist")))
/// }
///
/// let err = find_user("42").unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A client-facing error with a category and message.
    #[error("{message}")]
    Http {
        /// Classification and status.
        category: ErrorCategory,
        /// Machine-readable code; defaults to the category code.
        code: Option<String>,
        /// Human-readable message, safe to show to clients.
        message: String,
        /// Extra structured detail for the envelope.
        details: Option<serde_json::Value>,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Message for logs (not exposed to clients).
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A handler or hook panicked.
    #[error("Panicked: {message}")]
    Panic {
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The request body could not be read.
    #[error(transparent)]
    Body(#[from] BodyError),

    /// The request body is not the expected JSON.
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a client-facing error.
    #[must_use]
    pub fn http(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Http {
            category,
            code: None,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(ErrorCategory::BadRequest, message)
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::http(ErrorCategory::Unauthorized, message)
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::http(ErrorCategory::Forbidden, message)
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(ErrorCategory::NotFound, message)
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::http(ErrorCategory::Conflict, message)
    }

    /// Creates an unsupported media type error.
    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::http(ErrorCategory::UnsupportedMediaType, message)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Overrides the machine-readable code of an [`Error::Http`].
    #[must_use]
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        if let Self::Http { code, .. } = &mut self {
            *code = Some(new_code.into());
        }
        self
    }

    /// Attaches structured details to an [`Error::Http`].
    #[must_use]
    pub fn with_details(mut self, value: serde_json::Value) -> Self {
        if let Self::Http { details, .. } = &mut self {
            *details = Some(value);
        }
        self
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { category, .. } => *category,
            Self::Internal { .. } | Self::Panic { .. } => ErrorCategory::Internal,
            Self::Body(BodyError::Read(_) | BodyError::Consumed) => ErrorCategory::Internal,
            Self::Body(BodyError::Utf8(_)) | Self::Json(_) => ErrorCategory::BadRequest,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Internal errors get a generic message.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let category = self.category();
        let (code, message, details) = match self {
            Self::Http {
                code,
                message,
                details,
                ..
            } => (
                code.clone().unwrap_or_else(|| category.code().to_string()),
                message.clone(),
                details.clone(),
            ),
            _ if category == ErrorCategory::Internal => (
                category.code().to_string(),
                "Internal server error".to_string(),
                None,
            ),
            other => (category.code().to_string(), other.to_string(), None),
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code,
                message,
                category,
                details,
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Renders this error as a JSON response.
    #[must_use]
    pub fn to_response(&self, request_id: Option<&str>) -> Response {
        self.to_envelope(request_id).into_response(self.status_code())
    }
}

impl From<anyhow::Error> for Error {
    fn from(source: anyhow::Error) -> Self {
        Self::Internal {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorEnvelope {
    /// Renders the envelope as a JSON response with `status`.
    #[must_use]
    pub fn into_response(self, status: StatusCode) -> Response {
        let body = serde_json::to_vec(&self).unwrap_or_else(|_| {
            br#"{"error":{"code":"INTERNAL_ERROR","message":"Internal server error"}}"#.to_vec()
        });
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
