//! Route handler composition and the per-request hook pipeline.
//!
//! A route is composed once, at registration. Routes without hooks and
//! without validation get their handler back untouched
//! ([`RouteHandler::Direct`]); everything else runs through a [`Pipeline`]:
//!
//! 1. finally hooks are registered as deferred callbacks;
//! 2. request hooks run in registration order and may abort;
//! 3. request validation runs, routing failures through the failure cascade;
//! 4. the handler runs with the validated context;
//! 5. response validation runs; a failure is logged and, unless a failure
//!    handler supplies a replacement, the original response is kept;
//! 6. response hooks run, last registered first;
//! 7. on any error, every error hook runs and the first response wins;
//! 8. deferred callbacks run, last registered first.
//!
//! Nothing escapes: hooks and handlers are guarded against panics and every
//! path ends in a response.

use std::sync::Arc;

use serde_json::json;
use tracing::Instrument;

use daedalus_core::{
    catch_panic, catch_unwind, guard, BoxHandler, Completion, Context, Error, Outcome, Response,
};
use daedalus_telemetry::{metrics, serialize_error, Logger};
use daedalus_validation::{
    RequestCheck, RequestFailureHandler, ResponseCheck, ResponseFailureHandler,
};

use crate::hook::{Flow, HookSet};

/// Request validation of a composed route.
#[derive(Clone)]
pub struct RequestStage {
    /// The resolved validator.
    pub check: RequestCheck,
    /// The resolved failure cascade.
    pub on_failure: RequestFailureHandler,
}

/// Response validation of a composed route.
#[derive(Clone)]
pub struct ResponseStage {
    /// The resolved validator.
    pub check: ResponseCheck,
    /// The resolved failure cascade.
    pub on_failure: ResponseFailureHandler,
}

/// Everything a route is composed from.
pub struct RouteParts {
    /// The user handler.
    pub handler: BoxHandler,
    /// Application hooks.
    pub hooks: Arc<HookSet>,
    /// Request validation, if configured.
    pub request: Option<RequestStage>,
    /// Response validation, if configured.
    pub response: Option<ResponseStage>,
    /// Logger for pipeline diagnostics.
    pub logger: Logger,
}

/// The callable of a registered route.
#[derive(Clone)]
pub enum RouteHandler {
    /// The user handler itself; nothing to wrap.
    Direct(BoxHandler),
    /// The handler wrapped in hooks and validation.
    Pipeline(Arc<Pipeline>),
}

/// Composes a route.
///
/// ```rust
/// use std::sync::Arc;
/// use daedalus_core::{handler_fn, response, Context, Error};
/// use daedalus_hooks::{compose, HookSet, RouteParts};
/// use daedalus_telemetry::Logger;
///
/// let handler = handler_fn(|_ctx: Context| async {
///     Ok::<_, Error>(response::empty(http::StatusCode::NO_CONTENT))
/// });
/// let composed = compose(RouteParts {
///     handler: Arc::clone(&handler),
///     hooks: Arc::new(HookSet::default()),
///     request: None,
///     response: None,
///     logger: Logger::default(),
/// });
///
/// assert!(Arc::ptr_eq(composed.direct().unwrap(), &handler));
/// ```
pub fn compose(parts: RouteParts) -> RouteHandler {
    if parts.hooks.is_empty() && parts.request.is_none() && parts.response.is_none() {
        return RouteHandler::Direct(parts.handler);
    }
    RouteHandler::Pipeline(Arc::new(Pipeline {
        handler: parts.handler,
        hooks: parts.hooks,
        request: parts.request,
        response: parts.response,
        logger: parts.logger,
    }))
}

impl RouteHandler {
    /// The bare handler, when the route took the fast path.
    pub fn direct(&self) -> Option<&BoxHandler> {
        match self {
            Self::Direct(handler) => Some(handler),
            Self::Pipeline(_) => None,
        }
    }

    /// Returns `true` for fast-path routes.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// Handles one request. Always produces a response.
    pub async fn handle(&self, ctx: Context, logger: &Logger) -> Response {
        let span = tracing::debug_span!(
            "request",
            request_id = %ctx.request_id(),
            route = ctx.route().unwrap_or_default(),
        );
        match self {
            Self::Direct(handler) => {
                let (response, outcome) = match guard(|| handler.call(ctx.clone()))
                    .instrument(span)
                    .await
                {
                    Ok(response) => (response, Outcome::Completed),
                    Err(err) => (unhandled(logger, &ctx, &err), Outcome::Errored),
                };
                finish(&ctx, response, outcome, logger).await
            }
            Self::Pipeline(pipeline) => pipeline.run(ctx).instrument(span).await,
        }
    }
}

/// A composed route with hooks or validation.
pub struct Pipeline {
    handler: BoxHandler,
    hooks: Arc<HookSet>,
    request: Option<RequestStage>,
    response: Option<ResponseStage>,
    logger: Logger,
}

enum Exit {
    Completed(Response),
    Aborted(Response),
}

impl Pipeline {
    /// Runs the request through every stage.
    pub async fn run(&self, ctx: Context) -> Response {
        for hook in self.hooks.finally() {
            let hook = Arc::clone(hook);
            ctx.defer(move |done| hook(done));
        }

        let mut ctx = ctx;
        let (response, outcome) = match self.stages(&mut ctx).await {
            Ok(Exit::Completed(response)) => (response, Outcome::Completed),
            Ok(Exit::Aborted(response)) => (response, Outcome::Aborted),
            Err(err) => (self.recover(&ctx, err).await, Outcome::Errored),
        };
        finish(&ctx, response, outcome, &self.logger).await
    }

    async fn stages(&self, ctx: &mut Context) -> Result<Exit, Error> {
        for hook in self.hooks.request() {
            let flow = guard(|| hook(ctx.clone())).await?;
            match flow {
                Flow::Respond(response) => {
                    ctx.take_response();
                    return Ok(Exit::Aborted(response));
                }
                Flow::Continue(next) => *ctx = next,
            }
            if let Some(response) = ctx.take_response() {
                return Ok(Exit::Aborted(response));
            }
        }

        if let Some(stage) = &self.request {
            match catch_unwind((stage.check)(ctx.clone())).await? {
                Ok(validated) => *ctx = ctx.clone().with_validated(validated),
                Err(failure) => {
                    metrics::record_validation_failure("request", failure.stage().as_str());
                    self.logger.warn(
                        "request validation failed",
                        json!({
                            "request_id": ctx.request_id().to_string(),
                            "route": ctx.route(),
                            "failure": failure.to_value(),
                        }),
                    );
                    let replacement = catch_panic(|| (stage.on_failure)(&failure, &*ctx))?;
                    let response = replacement.unwrap_or_else(|| {
                        Error::bad_request("Request validation failed")
                            .to_response(Some(&ctx.request_id().to_string()))
                    });
                    return self.respond(&*ctx, response).await.map(Exit::Completed);
                }
            }
        }

        let response = guard(|| self.handler.call(ctx.clone())).await?;
        let response = self.check_response(&*ctx, response).await?;
        self.respond(&*ctx, response).await.map(Exit::Completed)
    }

    async fn check_response(&self, ctx: &Context, response: Response) -> Result<Response, Error> {
        let Some(stage) = &self.response else {
            return Ok(response);
        };
        match catch_unwind((stage.check)(&response)).await? {
            Ok(_) => Ok(response),
            Err(failure) => {
                metrics::record_validation_failure("response", failure.stage().as_str());
                self.logger.warn(
                    "response validation failed",
                    json!({
                        "request_id": ctx.request_id().to_string(),
                        "route": ctx.route(),
                        "status": response.status().as_u16(),
                        "failure": failure.to_value(),
                    }),
                );
                let replacement = catch_panic(|| (stage.on_failure)(&failure, ctx))?;
                Ok(replacement.unwrap_or(response))
            }
        }
    }

    async fn respond(&self, ctx: &Context, mut response: Response) -> Result<Response, Error> {
        for hook in self.hooks.response() {
            response = guard(|| hook(ctx.clone(), response)).await?;
        }
        Ok(response)
    }

    async fn recover(&self, ctx: &Context, err: Error) -> Response {
        let err = Arc::new(err);
        let mut handled = None;
        for (index, hook) in self.hooks.error().iter().enumerate() {
            match guard(|| hook(ctx.clone(), Arc::clone(&err))).await {
                Ok(Some(response)) if handled.is_none() => handled = Some(response),
                Ok(_) => {}
                Err(hook_err) => self.logger.error(
                    "error hook failed",
                    json!({
                        "request_id": ctx.request_id().to_string(),
                        "hook": index,
                        "error": serialize_error(&hook_err),
                    }),
                ),
            }
        }
        handled
            .or_else(|| ctx.take_response())
            .unwrap_or_else(|| unhandled(&self.logger, ctx, &err))
    }
}

/// Logs an error nobody handled and renders its envelope.
fn unhandled(logger: &Logger, ctx: &Context, err: &Error) -> Response {
    let request_id = ctx.request_id().to_string();
    logger.error(
        "unhandled error",
        json!({
            "request_id": request_id,
            "route": ctx.route(),
            "status": err.status_code().as_u16(),
            "error": serialize_error(err),
        }),
    );
    err.to_response(Some(&request_id))
}

/// Runs deferred callbacks and hands back the response.
async fn finish(ctx: &Context, response: Response, outcome: Outcome, logger: &Logger) -> Response {
    if !ctx.deferred().is_empty() {
        let completion = Completion::new(
            ctx.clone(),
            response.status(),
            response.headers().clone(),
            outcome,
        );
        ctx.deferred().run(&completion, logger).await;
    }
    response
}
