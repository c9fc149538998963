//! Route definitions.

use std::fmt;
use std::sync::Arc;

use http::{Extensions, Method};

use daedalus_core::{handler_fn, BoxHandler, Context, Handler, Response};
use daedalus_router::MethodSet;
use daedalus_validation::failure::failure_handler;
use daedalus_validation::{
    NoProvider, Provider, RequestFailureHandler, RequestSchema, RequestValidationError,
    ResponseFailureHandler, ResponseSchema, ResponseValidationError,
};

/// A route waiting to be registered with [`App::route`](crate::App::route).
///
/// `P` is the schema provider; it must match the application validator's,
/// which the compiler checks when the route is registered.
///
/// ```rust
/// use daedalus_core::{response, Context, Error};
/// use daedalus_server::{App, Route};
/// use http::StatusCode;
///
/// let mut app = App::new();
/// app.route(Route::get("/health", |_ctx: Context| async {
///     Ok::<_, Error>(response::text(StatusCode::OK, "ok"))
/// }))
/// .unwrap();
/// ```
pub struct Route<P: Provider = NoProvider> {
    pub(crate) methods: MethodSet,
    pub(crate) template: String,
    pub(crate) handler: BoxHandler,
    pub(crate) request_schema: Option<Arc<RequestSchema<P>>>,
    pub(crate) response_schema: Option<Arc<ResponseSchema<P>>>,
    pub(crate) on_request_failure: Option<RequestFailureHandler>,
    pub(crate) on_response_failure: Option<ResponseFailureHandler>,
    pub(crate) metadata: Extensions,
}

impl<P: Provider> Route<P> {
    /// A route for `methods` under `template`.
    pub fn new(methods: impl Into<MethodSet>, template: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            methods: methods.into(),
            template: template.into(),
            handler: handler_fn(handler),
            request_schema: None,
            response_schema: None,
            on_request_failure: None,
            on_response_failure: None,
            metadata: Extensions::new(),
        }
    }

    /// A `GET` route.
    pub fn get(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, template, handler)
    }

    /// A `POST` route.
    pub fn post(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, template, handler)
    }

    /// A `PUT` route.
    pub fn put(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, template, handler)
    }

    /// A `PATCH` route.
    pub fn patch(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PATCH, template, handler)
    }

    /// A `DELETE` route.
    pub fn delete(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, template, handler)
    }

    /// A route matching every method.
    pub fn any(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(MethodSet::Any, template, handler)
    }

    /// Validates requests against `schema`.
    pub fn request_schema(mut self, schema: RequestSchema<P>) -> Self {
        self.request_schema = Some(Arc::new(schema));
        self
    }

    /// Validates responses against `schema`.
    pub fn response_schema(mut self, schema: ResponseSchema<P>) -> Self {
        self.response_schema = Some(Arc::new(schema));
        self
    }

    /// Handles request validation failures of this route.
    ///
    /// Returning `None` falls back to the application handler, then to the
    /// built-in default.
    pub fn on_request_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestValidationError, &Context) -> Option<Response> + Send + Sync + 'static,
    {
        self.on_request_failure = Some(failure_handler(handler));
        self
    }

    /// Handles response validation failures of this route.
    pub fn on_response_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ResponseValidationError, &Context) -> Option<Response> + Send + Sync + 'static,
    {
        self.on_response_failure = Some(failure_handler(handler));
        self
    }

    /// Attaches typed metadata, keyed by its type.
    ///
    /// Plugins read it back from the registered
    /// [`RouteRecord`](crate::RouteRecord).
    pub fn metadata<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.metadata.insert(value);
        self
    }

    /// The methods this route answers.
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// The path template.
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl<P: Provider> fmt::Debug for Route<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("template", &self.template)
            .field("request_schema", &self.request_schema.is_some())
            .field("response_schema", &self.response_schema.is_some())
            .finish_non_exhaustive()
    }
}
