//! Panic containment for user callbacks.
//!
//! Hooks, handlers, failure handlers and deferred callbacks are user code.
//! A panic inside one is converted into [`Error::Panic`] so it can be routed
//! like any other error instead of unwinding through the pipeline.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::error::Error;

/// Awaits `future`, converting a panic during polling into [`Error::Panic`].
pub async fn catch_unwind<F: Future>(future: F) -> Result<F::Output, Error> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| Error::Panic {
            message: panic_message(&*payload),
        })
}

/// Invokes `call` and awaits the future it returns.
///
/// Panics raised while constructing the future or while polling it both
/// become [`Error::Panic`]; a returned `Err` passes through unchanged.
///
/// ```rust
/// # tokio_test::block_on(async {
/// use daedalus_core::{guard, Error};
///
/// let ok = guard(|| async { Ok::<_, Error>(1) }).await;
/// assert_eq!(ok.unwrap(), 1);
///
/// let panicked = guard(|| async {
///     if true {
///         panic!("boom");
///     }
///     Ok::<u8, Error>(0)
/// })
/// .await;
/// assert!(matches!(panicked, Err(Error::Panic { .. })));
/// # });
/// ```
pub async fn guard<T, F, Fut>(call: F) -> Result<T, Error>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let future = catch_panic(call)?;
    catch_unwind(future).await?
}

/// Runs a synchronous callback, converting a panic into [`Error::Panic`].
pub fn catch_panic<T>(call: impl FnOnce() -> T) -> Result<T, Error> {
    std::panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| Error::Panic {
        message: panic_message(&*payload),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
