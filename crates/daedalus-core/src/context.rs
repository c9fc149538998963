//! Request context types.
//!
//! A [`Context`] is created when a route matches and flows through every
//! request hook, the handler, and every response hook. Hooks never mutate a
//! context they were given; they return a new one built with
//! [`Context::with`] and the pipeline threads it forward. The request body,
//! the "already responded" slot and the deferred stack are shared by every
//! context derived from the same request.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Extensions, HeaderMap, HeaderValue, Method, Uri};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use daedalus_router::Params;
use daedalus_telemetry::Logger;

use crate::body::{Body, BodyError};
use crate::deferred::{Completion, Deferred};
use crate::error::Error;
use crate::state::State;
use crate::validated::ValidatedRequest;
use crate::{Request, Response};

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for log correlation.
///
/// ```
/// use daedalus_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses an incoming `x-request-id` header value.
    ///
    /// Returns `None` unless the value is a UUID.
    #[must_use]
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state shared by all derived contexts.
struct Exchange {
    request_id: RequestId,
    head: http::request::Parts,
    body: Mutex<Option<Body>>,
    response: Mutex<Option<Response>>,
    deferred: Deferred,
    started_at: Instant,
}

/// The per-request view handed to hooks and handlers.
#[derive(Clone)]
pub struct Context {
    exchange: Arc<Exchange>,
    params: Arc<Params>,
    route: Option<Arc<str>>,
    state: State,
    extensions: Arc<Extensions>,
    validated: Option<Arc<ValidatedRequest>>,
    logger: Logger,
}

impl Context {
    /// Creates a context for `request`.
    ///
    /// A UUID found in the `x-request-id` header is reused as the request ID.
    pub fn new(request: Request) -> Self {
        let (head, body) = request.into_parts();
        let request_id = head
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(RequestId::from_header)
            .unwrap_or_default();
        Self {
            exchange: Arc::new(Exchange {
                request_id,
                head,
                body: Mutex::new(Some(body)),
                response: Mutex::new(None),
                deferred: Deferred::default(),
                started_at: Instant::now(),
            }),
            params: Arc::new(Params::new()),
            route: None,
            state: State::default(),
            extensions: Arc::new(Extensions::new()),
            validated: None,
            logger: Logger::default(),
        }
    }

    /// Sets the captured path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Arc::new(params);
        self
    }

    /// Sets the matched route template.
    #[must_use]
    pub fn with_route(mut self, template: impl Into<Arc<str>>) -> Self {
        self.route = Some(template.into());
        self
    }

    /// Sets the application state.
    #[must_use]
    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    /// Sets the logger used by this request.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Attaches validated request data.
    #[must_use]
    pub fn with_validated(mut self, validated: ValidatedRequest) -> Self {
        self.validated = Some(Arc::new(validated));
        self
    }

    /// Returns a new context extended with `value`.
    ///
    /// The receiver is unchanged; a later hook sees the value only if the
    /// returned context is passed on.
    ///
    /// ```rust
    /// use daedalus_core::{Body, Context, Request};
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct User(String);
    ///
    /// let ctx = Context::new(Request::new(Body::empty()));
    /// let extended = ctx.clone().with(User("ada".into()));
    ///
    /// assert_eq!(extended.get::<User>(), Some(&User("ada".into())));
    /// assert!(ctx.get::<User>().is_none());
    /// ```
    #[must_use]
    pub fn with<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.extensions).insert(value);
        self
    }

    /// Returns an extension previously added with [`Context::with`].
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Returns a value from the application state.
    pub fn state<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.state.get::<T>()
    }

    /// The request ID.
    pub fn request_id(&self) -> RequestId {
        self.exchange.request_id
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.exchange.head.method
    }

    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.exchange.head.uri
    }

    /// The request path.
    pub fn path(&self) -> &str {
        self.exchange.head.uri.path()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.exchange.head.headers
    }

    /// Returns a header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.exchange
            .head
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    /// The raw `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.exchange
            .head
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// The captured path parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns one path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// The matched route template, e.g. `/users/:id`.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Decoded query string pairs in order; repeated keys repeat.
    ///
    /// A malformed query string yields no pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.exchange
            .head
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default()
    }

    /// Deserializes the query string into `T`.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let raw = self.exchange.head.uri.query().unwrap_or_default();
        serde_urlencoded::from_str(raw)
            .map_err(|e| Error::bad_request(format!("Invalid query string: {e}")))
    }

    /// Buffers and returns the request body.
    ///
    /// The body stays available to later readers.
    pub async fn bytes(&self) -> Result<Bytes, Error> {
        let body = self
            .exchange
            .body
            .lock()
            .take()
            .ok_or(BodyError::Consumed)?;
        let bytes = match body {
            Body::Full(bytes) => bytes,
            stream @ Body::Stream(_) => stream.collect().await?,
        };
        *self.exchange.body.lock() = Some(Body::Full(bytes.clone()));
        Ok(bytes)
    }

    /// Returns the request body as UTF-8 text.
    pub async fn text(&self) -> Result<String, Error> {
        let bytes = self.bytes().await?;
        let text = std::str::from_utf8(&bytes).map_err(BodyError::from)?;
        Ok(text.to_string())
    }

    /// Deserializes the request body as JSON.
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Takes the raw body, e.g. to stream it. Later reads fail.
    pub fn take_body(&self) -> Option<Body> {
        self.exchange.body.lock().take()
    }

    /// Validated request data, when the route has a request schema.
    pub fn validated(&self) -> Option<&ValidatedRequest> {
        self.validated.as_deref()
    }

    /// Deserializes the validated body.
    ///
    /// Returns `Ok(None)` when no body was validated.
    pub fn valid_body<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        self.decode_validated(|v| v.body.as_ref())
    }

    /// Deserializes the validated path parameters.
    pub fn valid_params<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        self.decode_validated(|v| v.params.as_ref())
    }

    /// Deserializes the validated query parameters.
    pub fn valid_queries<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        self.decode_validated(|v| v.queries.as_ref())
    }

    /// Deserializes the validated headers.
    pub fn valid_headers<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        self.decode_validated(|v| v.headers.as_ref())
    }

    fn decode_validated<T, F>(&self, field: F) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        F: FnOnce(&ValidatedRequest) -> Option<&serde_json::Value>,
    {
        match self.validated.as_deref().and_then(field) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::internal_with_source("validated value has an unexpected shape", e)),
            None => Ok(None),
        }
    }

    /// Finalizes the response from inside a hook.
    ///
    /// The pipeline treats this exactly like a hook returning a response:
    /// remaining request hooks and the handler are skipped.
    pub fn respond(&self, response: Response) {
        *self.exchange.response.lock() = Some(response);
    }

    /// Returns `true` once [`Context::respond`] was called and the response
    /// has not been collected yet.
    pub fn is_finalized(&self) -> bool {
        self.exchange.response.lock().is_some()
    }

    /// Collects a response set with [`Context::respond`].
    pub fn take_response(&self) -> Option<Response> {
        self.exchange.response.lock().take()
    }

    /// Registers a callback to run after the response is produced.
    ///
    /// Callbacks run in LIFO order whatever the outcome of the request.
    pub fn defer<F, Fut>(&self, callback: F)
    where
        F: FnOnce(Completion) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.exchange.deferred.push(callback);
    }

    /// The deferred callback stack of this request.
    pub fn deferred(&self) -> &Deferred {
        &self.exchange.deferred
    }

    /// The request-scoped logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.exchange.started_at.elapsed()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.exchange.request_id)
            .field("method", &self.exchange.head.method)
            .field("uri", &self.exchange.head.uri)
            .field("route", &self.route)
            .field("params", &self.params)
            .field("validated", &self.validated.is_some())
            .finish_non_exhaustive()
    }
}
