//! Hook types and the hook list builder.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use daedalus_core::{BoxFuture, Completion, Context, Error, Response};

/// What a request hook decided.
#[derive(Debug)]
pub enum Flow {
    /// Carry on with this context.
    Continue(Context),
    /// Stop here and send this response. Remaining request hooks, the
    /// handler and response hooks are skipped.
    Respond(Response),
}

impl From<Context> for Flow {
    fn from(ctx: Context) -> Self {
        Self::Continue(ctx)
    }
}

impl From<Response> for Flow {
    fn from(response: Response) -> Self {
        Self::Respond(response)
    }
}

/// Runs before the handler.
pub type RequestHook = Arc<dyn Fn(Context) -> BoxFuture<'static, Result<Flow, Error>> + Send + Sync>;

/// Runs after the handler and may replace the response.
pub type ResponseHook =
    Arc<dyn Fn(Context, Response) -> BoxFuture<'static, Result<Response, Error>> + Send + Sync>;

/// Runs when a hook or the handler failed. The first response returned is
/// sent to the client.
pub type ErrorHook = Arc<
    dyn Fn(Context, Arc<Error>) -> BoxFuture<'static, Result<Option<Response>, Error>> + Send + Sync,
>;

/// Runs once the request has completed, whatever the outcome.
pub type FinallyHook = Arc<dyn Fn(Completion) -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

/// Application-wide hook lists, in registration order.
///
/// ```rust
/// use daedalus_core::{Context, Error};
/// use daedalus_hooks::{Flow, Hooks};
///
/// #[derive(Clone)]
/// struct StartedAt(std::time::Instant);
///
/// let hooks = Hooks::new()
///     .on_request(|ctx: Context| async move {
///         Ok::<_, Error>(Flow::Continue(ctx.with(StartedAt(std::time::Instant::now()))))
///     })
///     .on_response(|_ctx, response| async move { Ok(response) });
///
/// assert_eq!(hooks.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Hooks {
    request: Vec<RequestHook>,
    response: Vec<ResponseHook>,
    error: Vec<ErrorHook>,
    finally: Vec<FinallyHook>,
}

impl Hooks {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request hook.
    #[must_use]
    pub fn on_request<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow, Error>> + Send + 'static,
    {
        self.request.push(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, Result<Flow, Error>> { Box::pin(hook(ctx)) },
        ));
        self
    }

    /// Adds a response hook.
    #[must_use]
    pub fn on_response<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        self.response.push(Arc::new(
            move |ctx: Context, response: Response| -> BoxFuture<'static, Result<Response, Error>> {
                Box::pin(hook(ctx, response))
            },
        ));
        self
    }

    /// Adds an error hook.
    #[must_use]
    pub fn on_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, Arc<Error>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Response>, Error>> + Send + 'static,
    {
        self.error.push(Arc::new(
            move |ctx: Context,
                  error: Arc<Error>|
                  -> BoxFuture<'static, Result<Option<Response>, Error>> {
                Box::pin(hook(ctx, error))
            },
        ));
        self
    }

    /// Adds a finally hook.
    #[must_use]
    pub fn on_finally<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Completion) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.finally.push(Arc::new(
            move |done: Completion| -> BoxFuture<'static, Result<(), Error>> { Box::pin(hook(done)) },
        ));
        self
    }

    /// Total number of hooks.
    pub fn len(&self) -> usize {
        self.request.len() + self.response.len() + self.error.len() + self.finally.len()
    }

    /// Returns `true` if no hook of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes the lists for use by composed routes.
    pub fn freeze(self) -> HookSet {
        let mut response_lifo = self.response;
        response_lifo.reverse();
        HookSet {
            request: self.request,
            response_lifo,
            error: self.error,
            finally: self.finally,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .field("error", &self.error.len())
            .field("finally", &self.finally.len())
            .finish()
    }
}

/// Immutable hook lists, with response hooks stored in execution order.
#[derive(Default)]
pub struct HookSet {
    request: Vec<RequestHook>,
    response_lifo: Vec<ResponseHook>,
    error: Vec<ErrorHook>,
    finally: Vec<FinallyHook>,
}

impl HookSet {
    /// Request hooks in registration order.
    pub fn request(&self) -> &[RequestHook] {
        &self.request
    }

    /// Response hooks, last registered first.
    pub fn response(&self) -> &[ResponseHook] {
        &self.response_lifo
    }

    /// Error hooks in registration order.
    pub fn error(&self) -> &[ErrorHook] {
        &self.error
    }

    /// Finally hooks in registration order.
    pub fn finally(&self) -> &[FinallyHook] {
        &self.finally
    }

    /// Returns `true` if no hook of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
            && self.response_lifo.is_empty()
            && self.error.is_empty()
            && self.finally.is_empty()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("request", &self.request.len())
            .field("response", &self.response_lifo.len())
            .field("error", &self.error.len())
            .field("finally", &self.finally.len())
            .finish()
    }
}
