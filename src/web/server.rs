//! Serving loop with bounded graceful drain.
//!
//! Connections are driven by hyper-util directly instead of `axum::serve` so
//! that header read timeouts can be set and every connection can be
//! force-closed once the shutdown grace period runs out.
//!
//! Timeouts:
//! - `read_timeout` bounds the request head and body. On HTTP/1.1 the head
//!   timer also runs while a keep-alive connection waits for its next
//!   request, so idle HTTP/1.1 connections close after `read_timeout`.
//! - `idle_timeout` is the HTTP/2 keep-alive ping interval.
//! - The context deadline bounds handler work. The transport timeout sits
//!   [`TIMEOUT_HEADROOM`] past it and only fires for a handler that ignores
//!   its deadline.

use std::time::Duration;

use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::{conn::auto::Builder, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use sales_config::WebConfig;
use thiserror::Error;
use tokio::{net::TcpListener, task::JoinSet};
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tracing::{debug, error, info, warn};

use super::app::App;
use super::lifecycle::Phase;

/// How long the transport timeout waits past the context deadline.
pub const TIMEOUT_HEADROOM: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("in-flight requests still running after {0:?}, connections closed")]
    ShutdownTimeout(Duration),
}

/// Serves `app` on `listener` until its shutdown signal fires, then drains.
///
/// Once draining starts the listener is closed, requests arriving on open
/// connections are refused with 503, and in-flight requests get
/// `shutdown_timeout` to finish before their connections are dropped.
pub async fn serve(listener: TcpListener, app: App, config: &WebConfig) -> Result<(), ServerError> {
    let shutdown = app.shutdown().clone();
    let lifecycle = app.lifecycle().clone();

    let handler_timeout = app.context_timeout().max(config.write_timeout) + TIMEOUT_HEADROOM;

    let router = app
        .into_router()
        .layer(TimeoutLayer::new(handler_timeout))
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout));
    let service = TowerToHyperService::new(router);

    let mut builder = Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_timeout);
    builder
        .http2()
        .timer(TokioTimer::new())
        .keep_alive_interval(config.idle_timeout);

    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();

    let addr = listener.local_addr()?;
    lifecycle.advance(Phase::Serving);
    info!(addr = %addr, "api listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let conn = builder.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());
                connections.spawn(async move {
                    if let Err(err) = conn.await {
                        debug!(peer = %peer, error = %err, "connection closed with error");
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown.wait() => break,
        }
    }

    lifecycle.advance(Phase::Draining);
    drop(listener);
    info!(
        reason = %shutdown.reason().unwrap_or_default(),
        in_flight = connections.len(),
        grace = ?config.shutdown_timeout,
        "draining"
    );

    let outcome = tokio::select! {
        _ = graceful.shutdown() => Ok(()),
        _ = tokio::time::sleep(config.shutdown_timeout) => {
            connections.abort_all();
            Err(ServerError::ShutdownTimeout(config.shutdown_timeout))
        }
    };

    lifecycle.advance(Phase::Stopped);
    match &outcome {
        Ok(()) => info!("stopped"),
        Err(err) => error!(error = %err, "stopped"),
    }
    outcome
}
