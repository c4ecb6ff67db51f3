use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use tracing::{error, info, warn};

use crate::metrics;
use crate::web::{Context, Handler, Middleware, handler};

/// Logs the start and completion of every request and records request
/// metrics. Runs outermost, so the status it sees is the one sent.
pub fn logger() -> Middleware {
    Middleware::new("logger", |next: Handler| {
        handler(move |ctx: Context, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let values = ctx.values();
                let method = values.method.clone();
                let route = values.route.clone();
                let path = req.uri().path().to_owned();

                info!(
                    trace_id = %values.trace_id,
                    method = %method,
                    path = %path,
                    "request started"
                );

                let result = next(ctx.clone(), req).await;

                let status = match (&result, ctx.status()) {
                    (_, Some(status)) => status,
                    (Err(err), None) => err.status(),
                    (Ok(()), None) => StatusCode::OK,
                };
                let latency = ctx.elapsed();

                match status.as_u16() {
                    400..=499 => warn!(
                        trace_id = %ctx.trace_id(),
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        "client error"
                    ),
                    500..=599 => error!(
                        trace_id = %ctx.trace_id(),
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        "server error"
                    ),
                    _ => info!(
                        trace_id = %ctx.trace_id(),
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        "request completed"
                    ),
                }

                metrics::track_request(method.as_str(), &route, status.as_u16(), latency);
                result
            }
        })
    })
}
