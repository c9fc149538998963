//! The application instance.
//!
//! An [`App`] owns everything shared by its routes: the validator, the hook
//! lists, the application failure handlers, application state and the root
//! logger. Routes are composed when they are registered; after setup the
//! app is only read, so one instance serves any number of concurrent
//! requests.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use http::header::ALLOW;
use http::HeaderValue;
use serde_json::json;

use daedalus_config::{DaedalusConfig, ValidationConfig};
use daedalus_core::{
    Completion, Context, Error, ErrorCategory, Request, Response, State, REQUEST_ID_HEADER,
};
use daedalus_hooks::{compose, Flow, HookSet, Hooks, RequestStage, ResponseStage, RouteParts};
use daedalus_router::{Lookup, Router};
use daedalus_telemetry::metrics::{self, InFlightGuard, UNMATCHED_ROUTE};
use daedalus_telemetry::Logger;
use daedalus_validation::failure::{
    cascade, default_request_handler, default_response_handler, failure_handler,
};
use daedalus_validation::{
    resolve_request_validator, resolve_response_validator, NoValidator, RequestFailureHandler,
    RequestValidationError, ResponseFailureHandler, ResponseValidationError, Validator,
};

use crate::error::AppError;
use crate::registry::{RouteId, RouteRecord, RouteRegistry};
use crate::route::Route;

/// Builder for [`App`].
///
/// ```rust
/// use daedalus_core::{Context, Error};
/// use daedalus_hooks::Flow;
/// use daedalus_server::App;
///
/// let app = App::builder()
///     .on_request(|ctx: Context| async move { Ok::<_, Error>(Flow::Continue(ctx)) })
///     .state(String::from("shared"))
///     .build();
/// assert!(app.routes().next().is_none());
/// ```
pub struct AppBuilder<V: Validator = NoValidator> {
    validator: Option<Arc<V>>,
    hooks: Hooks,
    on_request_failure: Option<RequestFailureHandler>,
    on_response_failure: Option<ResponseFailureHandler>,
    state: State,
    logger: Logger,
    validation: ValidationConfig,
}

impl AppBuilder<NoValidator> {
    /// A builder without a validator.
    pub fn new() -> Self {
        Self {
            validator: None,
            hooks: Hooks::new(),
            on_request_failure: None,
            on_response_failure: None,
            state: State::new(),
            logger: Logger::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Default for AppBuilder<NoValidator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Validator> AppBuilder<V> {
    /// Sets the validator shared by every route.
    ///
    /// Routes registered afterwards must use schemas of the validator's
    /// provider.
    pub fn validator<W: Validator>(self, validator: W) -> AppBuilder<W> {
        AppBuilder {
            validator: Some(Arc::new(validator)),
            hooks: self.hooks,
            on_request_failure: self.on_request_failure,
            on_response_failure: self.on_response_failure,
            state: self.state,
            logger: self.logger,
            validation: self.validation,
        }
    }

    /// Replaces the hook lists.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Appends a request hook.
    pub fn on_request<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow, Error>> + Send + 'static,
    {
        self.hooks = self.hooks.on_request(hook);
        self
    }

    /// Appends a response hook.
    pub fn on_response<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        self.hooks = self.hooks.on_response(hook);
        self
    }

    /// Appends an error hook.
    pub fn on_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, Arc<Error>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Response>, Error>> + Send + 'static,
    {
        self.hooks = self.hooks.on_error(hook);
        self
    }

    /// Appends a finally hook.
    pub fn on_finally<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Completion) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.hooks = self.hooks.on_finally(hook);
        self
    }

    /// Handles request validation failures of routes without their own
    /// handler, or whose handler returned `None`.
    pub fn on_request_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestValidationError, &Context) -> Option<Response> + Send + Sync + 'static,
    {
        self.on_request_failure = Some(failure_handler(handler));
        self
    }

    /// Handles response validation failures, after route handlers.
    pub fn on_response_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ResponseValidationError, &Context) -> Option<Response> + Send + Sync + 'static,
    {
        self.on_response_failure = Some(failure_handler(handler));
        self
    }

    /// Adds a value to the application state.
    pub fn state<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.state = self.state.with(value);
        self
    }

    /// Sets the root logger.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Switches request validation on or off for every route.
    pub fn request_validation(mut self, enabled: bool) -> Self {
        self.validation.request = enabled;
        self
    }

    /// Switches response validation on or off for every route.
    pub fn response_validation(mut self, enabled: bool) -> Self {
        self.validation.response = enabled;
        self
    }

    /// Applies the logging and validation sections of a configuration.
    pub fn config(mut self, config: &DaedalusConfig) -> Self {
        self.logger = Logger::new(&config.logging.logger_name);
        self.validation = config.validation;
        self
    }

    /// Freezes the hooks and builds the app.
    pub fn build(self) -> App<V> {
        App {
            pipeline_logger: self.logger.child("pipeline"),
            validator: self.validator,
            hooks: Arc::new(self.hooks.freeze()),
            on_request_failure: self.on_request_failure,
            on_response_failure: self.on_response_failure,
            state: self.state,
            logger: self.logger,
            validation: self.validation,
            router: Router::new(),
            registry: RouteRegistry::new(),
        }
    }
}

/// An application: routes plus everything they share.
pub struct App<V: Validator = NoValidator> {
    validator: Option<Arc<V>>,
    hooks: Arc<HookSet>,
    on_request_failure: Option<RequestFailureHandler>,
    on_response_failure: Option<ResponseFailureHandler>,
    state: State,
    logger: Logger,
    pipeline_logger: Logger,
    validation: ValidationConfig,
    router: Router<RouteId>,
    registry: RouteRegistry,
}

impl App<NoValidator> {
    /// Starts a builder.
    pub fn builder() -> AppBuilder<NoValidator> {
        AppBuilder::new()
    }

    /// An app without hooks or validation.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// An app without a validator, configured from `config`.
    ///
    /// Use [`AppBuilder::config`] to combine a configuration with a validator.
    pub fn from_config(config: &DaedalusConfig) -> Self {
        Self::builder().config(config).build()
    }
}

impl Default for App<NoValidator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Validator> App<V> {
    /// Registers a route.
    ///
    /// The route's schemas are paired with the app validator, its failure
    /// handlers are layered over the app's, and the result is composed with
    /// the app hooks. Nothing is registered when this fails.
    pub fn route(&mut self, route: Route<V::Provider>) -> Result<RouteId, AppError> {
        let Route {
            methods,
            template,
            handler,
            request_schema,
            response_schema,
            on_request_failure,
            on_response_failure,
            metadata,
        } = route;
        let has_request_schema = request_schema.is_some();
        let has_response_schema = response_schema.is_some();
        let misconfigured = |source| AppError::Configuration {
            template: template.clone(),
            source,
        };

        let request = resolve_request_validator(self.validator.clone(), request_schema)
            .map_err(misconfigured)?
            .filter(|_| self.validation.request)
            .map(|validator| RequestStage {
                check: validator.into_check(),
                on_failure: cascade(
                    on_request_failure,
                    self.on_request_failure.clone(),
                    default_request_handler(),
                ),
            });
        let response = resolve_response_validator(self.validator.clone(), response_schema)
            .map_err(misconfigured)?
            .filter(|_| self.validation.response)
            .map(|validator| ResponseStage {
                check: validator.into_check(),
                on_failure: cascade(
                    on_response_failure,
                    self.on_response_failure.clone(),
                    default_response_handler(),
                ),
            });

        let handler = compose(RouteParts {
            handler,
            hooks: Arc::clone(&self.hooks),
            request,
            response,
            logger: self.pipeline_logger.clone(),
        });

        let id = self.registry.next_id();
        self.router.insert(&methods, &template, id)?;

        self.logger.debug(
            "route registered",
            json!({
                "route_id": id.to_string(),
                "methods": methods.to_string(),
                "template": template,
                "fast_path": handler.is_direct(),
            }),
        );

        let record = RouteRecord::new(
            methods,
            Arc::from(template),
            has_request_schema,
            has_response_schema,
            metadata,
            handler,
        );
        Ok(self.registry.insert(record))
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> std::slice::Iter<'_, RouteRecord> {
        self.registry.iter()
    }

    /// The route registry.
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Looks a route up by the handle returned from [`App::route`].
    pub fn route_record(&self, id: RouteId) -> Option<&RouteRecord> {
        self.registry.get(id)
    }

    /// The root logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Handles one request. Always produces a response.
    ///
    /// Unknown paths get `404`, known paths with another method get `405`
    /// with an `Allow` header. Every response carries `x-request-id`.
    pub async fn handle(&self, request: Request) -> Response {
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let ctx = Context::new(request)
            .with_state(self.state.clone())
            .with_logger(self.logger.clone());
        let request_id = ctx.request_id();

        let (route, mut response) = match self.router.lookup(&method, &path) {
            Lookup::Found(found) => match self.registry.get(*found.value) {
                Some(record) => {
                    let template = record.template_arc();
                    let ctx = ctx
                        .with_params(found.params)
                        .with_route(Arc::clone(&template));
                    let response = record.handler().handle(ctx, &self.pipeline_logger).await;
                    (Some(template), response)
                }
                None => (None, not_found(&method, &path, &ctx)),
            },
            Lookup::MethodNotAllowed { allow } => {
                let mut response = Error::http(
                    ErrorCategory::MethodNotAllowed,
                    format!("method {method} is not allowed for {path}"),
                )
                .to_response(Some(&request_id.to_string()));
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                (None, response)
            }
            Lookup::NotFound => (None, not_found(&method, &path, &ctx)),
        };

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let status = response.status();
        let elapsed = started.elapsed();
        metrics::record_request(
            method.as_str(),
            route.as_deref().unwrap_or(UNMATCHED_ROUTE),
            status.as_u16(),
            elapsed,
        );
        tracing::debug!(
            request_id = %request_id,
            http.method = %method,
            http.path = %path,
            http.status_code = status.as_u16(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "request completed"
        );

        response
    }
}

fn not_found(method: &http::Method, path: &str, ctx: &Context) -> Response {
    Error::not_found(format!("no route for {method} {path}"))
        .to_response(Some(&ctx.request_id().to_string()))
}

impl<V: Validator> fmt::Debug for App<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("validator", &self.validator.is_some())
            .field("validation", &self.validation)
            .field("routes", &self.registry.len())
            .field("logger", &self.logger.name())
            .finish_non_exhaustive()
    }
}
