//! Handler abstraction.
//!
//! A [`Handler`] turns a [`Context`] into a [`Response`]. Any
//! `Fn(Context) -> impl Future<Output = Result<Response, Error>>` closure is a
//! handler; routes store them type-erased as [`BoxHandler`].

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::{BoxFuture, Response};

/// A request handler.
///
/// # Example
///
/// ```rust
/// use daedalus_core::{handler_fn, response, Context, Error};
/// use http::StatusCode;
///
/// let hello = handler_fn(|ctx: Context| async move {
///     let name = ctx.param("name").unwrap_or("world").to_string();
///     Ok::<_, Error>(response::text(StatusCode::OK, format!("hello {name}")))
/// });
/// # let _ = hello;
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Response, Error>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Response, Error>> {
        Box::pin(self(ctx))
    }
}

/// A shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Erases a handler into a [`BoxHandler`].
pub fn handler_fn<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}
