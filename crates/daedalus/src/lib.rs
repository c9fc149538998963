//! # Daedalus
//!
//! **HTTP request lifecycle framework with schema validation and hooks**
//!
//! Daedalus routes a request through a fixed, per-route pipeline:
//!
//! - **Hooks** – request, response, error and finally hooks at app and route level
//! - **Validation** – pluggable schema validators for params, queries, headers and bodies
//! - **Failure handlers** – route, app and framework defaults, tried in that order
//! - **Fast path** – routes with no hooks and no validation call the handler directly
//!
//! ## Quick Start
//!
//! ```rust
//! use daedalus::prelude::*;
//! use http::StatusCode;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut app = App::builder()
//!     .on_response(|_ctx: Context, mut response: Response| async move {
//!         response
//!             .headers_mut()
//!             .insert("x-served-by", http::HeaderValue::from_static("daedalus"));
//!         Ok::<_, Error>(response)
//!     })
//!     .build();
//!
//! app.route(Route::get("/hello/:name", |ctx: Context| async move {
//!     let name = ctx.param("name").unwrap_or("world").to_string();
//!     Ok::<_, Error>(response::text(StatusCode::OK, format!("hello {name}")))
//! }))?;
//!
//! let request = http::Request::get("/hello/ada").body(Body::empty())?;
//! let response = app.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.headers()["x-served-by"], "daedalus");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Router → request hooks → request validation → Handler
//!                                                            ↓
//! Response ← finally ← response hooks ← response validation ←┘
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use daedalus_core as core;

// Re-export routing
pub use daedalus_router as router;

// Re-export validation contracts and resolvers
pub use daedalus_validation as validation;

// Re-export hook composition
pub use daedalus_hooks as hooks;

// Re-export logging and metrics
pub use daedalus_telemetry as telemetry;

// Re-export configuration loading
pub use daedalus_config as config;

// Re-export the app and HTTP server
pub use daedalus_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use daedalus::prelude::*;
///
/// let app = App::new();
/// assert_eq!(app.routes().count(), 0);
/// ```
pub mod prelude {
    pub use daedalus_core::{
        response, Body, Completion, Context, Error, ErrorCategory, Outcome, Request, RequestId,
        Response, Result,
    };

    pub use daedalus_hooks::{Flow, Hooks};

    pub use daedalus_validation::{
        NoProvider, NoValidator, Provider, ProviderId, RequestSchema, RequestValidationError,
        ResponseSchema, ResponseValidationError, Validator,
    };

    pub use daedalus_telemetry::Logger;

    pub use daedalus_config::{ConfigLoader, DaedalusConfig};

    pub use daedalus_server::{
        App, AppBuilder, AppError, Route, RouteId, Server, ServerConfig, ShutdownSignal,
    };
}
