//! HTTP/1.1 server.
//!
//! Binds a TCP listener, serves each connection with hyper on its own task
//! and hands every request to [`App::handle`]. On shutdown the server stops
//! accepting, asks open connections to finish their current request, and
//! waits up to the configured timeout for them to close.
//!
//! ```rust,no_run
//! use daedalus_server::{App, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(App::new(), config).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use daedalus_core::Body;
use daedalus_telemetry::metrics;
use daedalus_validation::{NoValidator, Validator};

use crate::app::App;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves an [`App`] over HTTP/1.1.
pub struct Server<V: Validator = NoValidator> {
    app: Arc<App<V>>,
    config: ServerConfig,
}

impl<V: Validator> Server<V> {
    /// Creates a server for `app`.
    pub fn new(app: App<V>, config: ServerConfig) -> Self {
        Self {
            app: Arc::new(app),
            config,
        }
    }

    /// The served application.
    pub fn app(&self) -> &App<V> {
        &self.app
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        metrics::describe_metrics();
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, "server listening"),
            Err(err) => tracing::warn!(error = %err, "server listening on unknown address"),
        }

        let tracker = ConnectionTracker::new();
        let limiter = self
            .config
            .max_connections()
            .map(|max| Arc::new(Semaphore::new(max)));
        let keep_alive = self.config.keep_alive_timeout().is_some();

        loop {
            let accepted = tokio::select! {
                accepted = accept(&listener, limiter.as_ref()) => accepted,
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            };

            match accepted {
                Ok((stream, remote_addr, permit)) => {
                    let app = Arc::clone(&self.app);
                    let token = tracker.acquire();
                    let shutdown = shutdown.clone();

                    tokio::spawn(async move {
                        serve_connection(app, stream, remote_addr, shutdown, keep_alive).await;
                        drop(permit);
                        drop(token);
                    });
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to accept connection");
                }
            }
        }

        let timeout = self.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            ?timeout,
            "waiting for open connections"
        );
        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }
        tracing::info!("server stopped");
    }
}

async fn accept(
    listener: &TcpListener,
    limiter: Option<&Arc<Semaphore>>,
) -> std::io::Result<(TcpStream, SocketAddr, Option<OwnedSemaphorePermit>)> {
    let permit = match limiter {
        // The semaphore is never closed.
        Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
        None => None,
    };
    let (stream, remote_addr) = listener.accept().await?;
    Ok((stream, remote_addr, permit))
}

async fn serve_connection<V: Validator>(
    app: Arc<App<V>>,
    stream: TcpStream,
    remote_addr: SocketAddr,
    shutdown: ShutdownSignal,
    keep_alive: bool,
) {
    let service = service_fn(move |request: hyper::Request<Incoming>| {
        let app = Arc::clone(&app);
        async move {
            let response = app.handle(request.map(Body::wrap)).await;
            Ok::<_, Infallible>(response.map(Body::into_http))
        }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let stop = shutdown.recv();
    tokio::pin!(stop);
    let mut stopping = false;

    let result = loop {
        tokio::select! {
            result = conn.as_mut() => break result,
            () = &mut stop, if !stopping => {
                stopping = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    };
    if let Err(err) = result {
        tracing::debug!(%remote_addr, error = %err, "connection closed with error");
    }
}
