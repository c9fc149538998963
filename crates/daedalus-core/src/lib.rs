//! # Daedalus Core
//!
//! Core types shared by every Daedalus crate:
//!
//! - [`Body`], [`Request`] and [`Response`] - buffered or streamed HTTP messages
//! - [`Context`] - per-request view threaded through hooks and handlers
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Error`] - categorised framework error with a JSON [`ErrorEnvelope`]
//! - [`Handler`] - the request handler abstraction
//! - [`Deferred`] - callbacks run once a request has completed

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::future::Future;
use std::pin::Pin;

mod body;
mod context;
mod deferred;
mod error;
mod guard;
mod handler;
pub mod response;
mod state;
mod validated;

pub use body::{Body, BodyError, BoxError, HttpBody};
pub use context::{Context, RequestId, REQUEST_ID_HEADER};
pub use deferred::{Completion, Deferred, Outcome};
pub use error::{Error, ErrorCategory, ErrorDetail, ErrorEnvelope, Result};
pub use guard::{catch_panic, catch_unwind, guard};
pub use handler::{handler_fn, BoxHandler, Handler};
pub use state::State;
pub use validated::ValidatedRequest;

pub use daedalus_router::Params;

/// An HTTP request carrying a [`Body`].
pub type Request = http::Request<Body>;

/// An HTTP response carrying a [`Body`].
pub type Response = http::Response<Body>;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
