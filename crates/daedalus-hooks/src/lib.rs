//! # Daedalus Hooks
//!
//! The request lifecycle of a route: request, response, error and finally
//! hooks around request validation, the handler and response validation.
//!
//! Routes are composed once with [`compose`]. A route with no hooks and no
//! validation is served by its handler directly; see [`RouteHandler`].

#![doc(html_root_url = "https://docs.rs/daedalus-hooks/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod hook;
mod pipeline;

pub use hook::{ErrorHook, FinallyHook, Flow, HookSet, Hooks, RequestHook, ResponseHook};
pub use pipeline::{compose, Pipeline, RequestStage, ResponseStage, RouteHandler, RouteParts};
