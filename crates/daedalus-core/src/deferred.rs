//! Deferred callbacks that run once a request has completed.
//!
//! Callbacks run in LIFO order, each one guarded: a failing or panicking
//! callback is logged and the rest still run. Callbacks registered while the
//! stack is draining are picked up in the same pass.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use serde_json::json;

use daedalus_telemetry::{serialize_error, Logger};

use crate::context::Context;
use crate::error::Error;
use crate::guard::guard;
use crate::BoxFuture;

/// How the request pipeline finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler produced a response and response hooks ran.
    Completed,
    /// A request hook short-circuited with its own response.
    Aborted,
    /// A hook or the handler failed; the response came from error handling.
    Errored,
}

/// Read-only view of a finished request, passed to deferred callbacks.
#[derive(Debug, Clone)]
pub struct Completion {
    context: Context,
    status: StatusCode,
    headers: HeaderMap,
    outcome: Outcome,
}

impl Completion {
    /// Creates a completion record.
    pub fn new(context: Context, status: StatusCode, headers: HeaderMap, outcome: Outcome) -> Self {
        Self {
            context,
            status,
            headers,
            outcome,
        }
    }

    /// The last context seen by the pipeline.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Status of the response sent to the client.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers of the response sent to the client.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Which branch the pipeline took.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

type DeferredFn = Box<dyn FnOnce(Completion) -> BoxFuture<'static, Result<(), Error>> + Send>;

/// A per-request stack of deferred callbacks.
#[derive(Clone, Default)]
pub struct Deferred {
    stack: Arc<Mutex<Vec<DeferredFn>>>,
}

impl Deferred {
    /// Pushes a callback.
    pub fn push<F, Fut>(&self, callback: F)
    where
        F: FnOnce(Completion) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.stack
            .lock()
            .push(Box::new(move |completion| Box::pin(callback(completion))));
    }

    /// Number of callbacks waiting to run.
    pub fn len(&self) -> usize {
        self.stack.lock().len()
    }

    /// Returns `true` if no callbacks are waiting.
    pub fn is_empty(&self) -> bool {
        self.stack.lock().is_empty()
    }

    /// Drains the stack, most recently pushed first.
    ///
    /// Returns the number of callbacks that failed.
    pub async fn run(&self, completion: &Completion, logger: &Logger) -> usize {
        let mut failures = 0;
        loop {
            let next = self.stack.lock().pop();
            let Some(callback) = next else {
                break;
            };
            let view = completion.clone();
            if let Err(err) = guard(move || callback(view)).await {
                failures += 1;
                logger.error(
                    "deferred callback failed",
                    json!({
                        "request_id": completion.context().request_id().to_string(),
                        "error": serialize_error(&err),
                    }),
                );
            }
        }
        failures
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;
    use daedalus_telemetry::LogLevel;

    fn completion() -> Completion {
        let request = Request::new(crate::Body::empty());
        Completion::new(
            Context::new(request),
            StatusCode::OK,
            HeaderMap::new(),
            Outcome::Completed,
        )
    }

    #[tokio::test]
    async fn test_runs_lifo_and_survives_failures() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let deferred = Deferred::default();

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            deferred.push(move |_| async move {
                order.lock().push(label);
                if label == "second" {
                    return Err(Error::internal("cleanup failed"));
                }
                Ok(())
            });
        }
        deferred.push(|_| async {
            if true {
                panic!("callback panicked");
            }
            Ok::<(), Error>(())
        });

        let (logger, capture) = Logger::capturing("test");
        let failures = deferred.run(&completion(), &logger).await;

        assert_eq!(failures, 2);
        assert_eq!(*order.lock(), vec!["third", "second", "first"]);
        assert_eq!(capture.at(LogLevel::Error).len(), 2);
        assert!(deferred.is_empty());
    }

    #[tokio::test]
    async fn test_callback_sees_completion() {
        let deferred = Deferred::default();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        deferred.push(move |done: Completion| async move {
            *sink.lock() = Some((done.status(), done.outcome()));
            Ok::<(), Error>(())
        });

        deferred.run(&completion(), &Logger::default()).await;
        assert_eq!(*seen.lock(), Some((StatusCode::OK, Outcome::Completed)));
    }

    #[tokio::test]
    async fn test_nested_deferral_runs_in_same_pass() {
        let deferred = Deferred::default();
        let hits = Arc::new(Mutex::new(0));
        let inner_deferred = deferred.clone();
        let inner_hits = Arc::clone(&hits);
        deferred.push(move |_| async move {
            let hits = Arc::clone(&inner_hits);
            inner_deferred.push(move |_| async move {
                *hits.lock() += 1;
                Ok::<(), Error>(())
            });
            Ok::<(), Error>(())
        });

        deferred.run(&completion(), &Logger::default()).await;
        assert_eq!(*hits.lock(), 1);
    }
}
