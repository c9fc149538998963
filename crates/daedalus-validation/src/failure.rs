//! Validation failure handler resolution.
//!
//! Request and response failures are handled by the same three-tier
//! cascade: the route's handler, then the application's handler, then a
//! built-in default. A tier that returns `None` passes the failure on.

use std::sync::Arc;

use serde_json::json;

use daedalus_core::{Context, Error, Response};

use crate::error::{PreValidationError, RequestValidationError, ResponseValidationError};

/// A failure handler. Returning `None` defers to the next tier.
pub type FailureHandler<E> = Arc<dyn Fn(&E, &Context) -> Option<Response> + Send + Sync>;

/// Handler for request validation failures.
pub type RequestFailureHandler = FailureHandler<RequestValidationError>;

/// Handler for response validation failures.
pub type ResponseFailureHandler = FailureHandler<ResponseValidationError>;

/// Wraps a closure as a [`FailureHandler`].
pub fn failure_handler<E, F>(handler: F) -> FailureHandler<E>
where
    F: Fn(&E, &Context) -> Option<Response> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Resolves route, application and default handlers into one.
///
/// ```rust
/// use std::sync::Arc;
/// use daedalus_core::{Body, Context, Request};
/// use daedalus_validation::failure::{cascade, failure_handler};
///
/// let route = failure_handler(|_: &u8, _: &Context| None);
/// let app = failure_handler(|code: &u8, _: &Context| {
///     Some(daedalus_core::response::text(http::StatusCode::IM_A_TEAPOT, code.to_string()))
/// });
/// let default = failure_handler(|_: &u8, _: &Context| None);
///
/// let resolved = cascade(Some(route), Some(app), default);
/// let ctx = Context::new(Request::new(Body::empty()));
/// assert_eq!(resolved(&7, &ctx).unwrap().status(), 418);
/// ```
pub fn cascade<E: 'static>(
    route: Option<FailureHandler<E>>,
    instance: Option<FailureHandler<E>>,
    default: FailureHandler<E>,
) -> FailureHandler<E> {
    Arc::new(move |failure: &E, ctx: &Context| {
        route
            .as_ref()
            .and_then(|handler| handler(failure, ctx))
            .or_else(|| instance.as_ref().and_then(|handler| handler(failure, ctx)))
            .or_else(|| default(failure, ctx))
    })
}

/// Default response for request validation failures.
///
/// Unsupported media types get `415` listing the supported types; every
/// other failure gets `400` with a generic message. Validator output is
/// never included.
pub fn default_request_failure(failure: &RequestValidationError, ctx: &Context) -> Option<Response> {
    let request_id = ctx.request_id().to_string();
    let error = match failure {
        RequestValidationError::PreValidation(PreValidationError::UnsupportedMediaType {
            supported,
            requested,
        }) => Error::unsupported_media_type("Unsupported media type")
            .with_details(json!({ "supported": supported, "requested": requested })),
        RequestValidationError::PreValidation(pre) => {
            Error::bad_request("Malformed request body").with_code(pre.code())
        }
        RequestValidationError::Validation(_) => {
            Error::bad_request("Request validation failed").with_code("VALIDATION_FAILED")
        }
    };
    Some(error.to_response(Some(&request_id)))
}

/// Default for response validation failures: keep the original response.
pub fn default_response_failure(_: &ResponseValidationError, _: &Context) -> Option<Response> {
    None
}

/// The built-in request failure handler.
pub fn default_request_handler() -> RequestFailureHandler {
    Arc::new(default_request_failure)
}

/// The built-in response failure handler.
pub fn default_response_handler() -> ResponseFailureHandler {
    Arc::new(default_response_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldFailures, Rejection};
    use daedalus_core::{response, Body, Request};
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> Context {
        Context::new(Request::new(Body::empty()))
    }

    fn status(code: StatusCode) -> FailureHandler<u8> {
        failure_handler(move |_, _| Some(response::empty(code)))
    }

    fn pass() -> FailureHandler<u8> {
        failure_handler(|_, _| None)
    }

    #[test]
    fn test_route_handler_wins() {
        let resolved = cascade(
            Some(status(StatusCode::CONFLICT)),
            Some(status(StatusCode::GONE)),
            status(StatusCode::BAD_REQUEST),
        );
        assert_eq!(resolved(&0, &ctx()).unwrap().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_falls_through_tiers_returning_none() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let route = failure_handler(move |_: &u8, _: &Context| {
            counted.fetch_add(1, Ordering::SeqCst);
            None
        });
        let resolved = cascade(Some(route), Some(pass()), status(StatusCode::BAD_REQUEST));
        assert_eq!(resolved(&0, &ctx()).unwrap().status(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let resolved = cascade(None, Some(status(StatusCode::GONE)), pass());
        assert_eq!(resolved(&0, &ctx()).unwrap().status(), StatusCode::GONE);

        let resolved = cascade(None, None, pass());
        assert!(resolved(&0, &ctx()).is_none());
    }

    #[tokio::test]
    async fn test_default_request_failure_is_generic() {
        let failure = RequestValidationError::Validation(FieldFailures {
            body: Some(Rejection::new("secret validator internals")),
            ..FieldFailures::default()
        });
        let resp = default_request_failure(&failure, &ctx()).unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let text = String::from_utf8(resp.into_body().collect().await.unwrap().to_vec()).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("VALIDATION_FAILED"));
    }

    #[tokio::test]
    async fn test_default_unsupported_media_type() {
        let failure = RequestValidationError::PreValidation(
            PreValidationError::UnsupportedMediaType {
                supported: vec!["application/json".into()],
                requested: Some("application/xml".into()),
            },
        );
        let resp = default_request_failure(&failure, &ctx()).unwrap();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let bytes = resp.into_body().collect().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
        assert_eq!(value["error"]["details"]["requested"], "application/xml");
    }

    #[test]
    fn test_default_response_failure_keeps_original() {
        let failure = ResponseValidationError::NoSchemaForStatusCode { status: 500 };
        assert!(default_response_failure(&failure, &ctx()).is_none());
    }
}
