//! Response builders.

use bytes::Bytes;
use futures_util::Stream;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;

use crate::body::{Body, BoxError};
use crate::error::{Error, ErrorCategory, ErrorDetail, ErrorEnvelope};
use crate::Response;

fn with_content_type(status: StatusCode, content_type: HeaderValue, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}

/// Serializes `value` as a JSON response.
///
/// ```rust
/// use daedalus_core::response;
/// use http::StatusCode;
///
/// let resp = response::json(StatusCode::CREATED, &serde_json::json!({ "id": 1 })).unwrap();
/// assert_eq!(resp.status(), StatusCode::CREATED);
/// assert_eq!(resp.headers()["content-type"], "application/json");
/// ```
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Response, Error> {
    let body = serde_json::to_vec(value)
        .map_err(|e| Error::internal_with_source("failed to serialize response", e))?;
    Ok(with_content_type(
        status,
        HeaderValue::from_static("application/json"),
        Body::from(body),
    ))
}

/// A `text/plain` response.
pub fn text(status: StatusCode, text: impl Into<String>) -> Response {
    with_content_type(
        status,
        HeaderValue::from_static("text/plain; charset=utf-8"),
        Body::from(text.into()),
    )
}

/// A response without a body.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// A streamed response. The body is never buffered by the framework.
///
/// An invalid `content_type` falls back to `application/octet-stream`.
pub fn stream<S, E>(status: StatusCode, content_type: &str, stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    let value = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    with_content_type(status, value, Body::from_stream(stream))
}

/// A JSON error envelope with an explicit status and code.
pub fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
    let category = match status.as_u16() {
        401 => ErrorCategory::Unauthorized,
        403 => ErrorCategory::Forbidden,
        404 => ErrorCategory::NotFound,
        405 => ErrorCategory::MethodNotAllowed,
        409 => ErrorCategory::Conflict,
        415 => ErrorCategory::UnsupportedMediaType,
        429 => ErrorCategory::RateLimited,
        503 => ErrorCategory::Unavailable,
        400..=499 => ErrorCategory::BadRequest,
        _ => ErrorCategory::Internal,
    };
    ErrorEnvelope {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            category,
            details: None,
        },
        request_id: None,
    }
    .into_response(status)
}
