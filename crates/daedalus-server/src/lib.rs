//! # Daedalus Server
//!
//! The application instance and its HTTP binding:
//!
//! - [`App`] holds the validator, hooks and failure handlers shared by all
//!   routes, and a [`RouteRegistry`] of composed routes
//! - [`App::handle`] dispatches one request: route lookup, `404`/`405`,
//!   the route pipeline, request ID and metrics
//! - [`Server`] serves an app over HTTP/1.1 with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use daedalus_core::{response, Context, Error};
//! use daedalus_server::{App, Route};
//! use http::StatusCode;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut app = App::new();
//! app.route(Route::get("/users/:id", |ctx: Context| async move {
//!     let id = ctx.param("id").unwrap_or_default().to_string();
//!     Ok::<_, Error>(response::text(StatusCode::OK, id))
//! }))
//! .unwrap();
//!
//! let request = http::Request::get("/users/42")
//!     .body(daedalus_core::Body::empty())
//!     .unwrap();
//! let response = app.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # }
//! ```
//!
//! ## Provider checking
//!
//! A route's schemas must come from the app validator's provider. Mixing
//! providers does not compile:
//!
//! ```rust,compile_fail
//! use daedalus_core::{response, Context, Error};
//! use daedalus_server::{App, Route};
//! use daedalus_validation::fixtures::ShapeValidator;
//! use daedalus_validation::{NoProvider, RequestSchema};
//!
//! let mut app = App::builder().validator(ShapeValidator).build();
//! let route = Route::<NoProvider>::get("/", |_ctx: Context| async {
//!     Ok::<_, Error>(response::empty(http::StatusCode::OK))
//! })
//! .request_schema(RequestSchema::new());
//! app.route(route).unwrap();
//! ```
//!
//! Schemas built at runtime carry their provider ID, which is checked on
//! registration instead; see [`AppError::Configuration`].

#![doc(html_root_url = "https://docs.rs/daedalus-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod error;
mod registry;
mod route;
mod server;
mod shutdown;

pub use app::{App, AppBuilder};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{AppError, ServerError};
pub use registry::{RouteId, RouteRecord, RouteRegistry};
pub use route::Route;
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
