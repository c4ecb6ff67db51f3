use std::sync::Arc;

use axum::extract::Request;
use sales_core::AppError;
use tracing::{error, info, warn};

use crate::metrics;
use crate::web::{Context, Handler, HandlerResult, Middleware, handler};

/// The only middleware that writes error responses.
///
/// Every error from the inner chain is logged and translated. A shutdown
/// error is answered with 503 and then returned, so the app can begin
/// draining.
pub fn errors() -> Middleware {
    Middleware::new("errors", |next: Handler| {
        handler(move |ctx: Context, req: Request| {
            let next = Arc::clone(&next);
            async move {
                match next(ctx.clone(), req).await {
                    Ok(()) => Ok(()),
                    Err(err) => translate(&ctx, err),
                }
            }
        })
    })
}

/// Logs `err` by class and writes its response body, unless a response was
/// already written for this request.
pub fn translate(ctx: &Context, err: AppError) -> HandlerResult {
    let trace_id = ctx.trace_id();
    match &err {
        AppError::Trusted { status, message } if status.is_server_error() => {
            error!(trace_id = %trace_id, status = status.as_u16(), message = %message, "request failed")
        }
        AppError::Trusted { status, message } => {
            info!(trace_id = %trace_id, status = status.as_u16(), message = %message, "request rejected")
        }
        AppError::Fields(fields) => {
            info!(trace_id = %trace_id, fields = %fields, "request failed validation")
        }
        AppError::Shutdown(reason) => {
            warn!(trace_id = %trace_id, reason = %reason, "shutdown requested by handler")
        }
        AppError::Unclassified(source) => {
            error!(trace_id = %trace_id, error = ?source, "unclassified error")
        }
    }
    metrics::track_error(err.kind());

    if ctx.is_started() {
        warn!(trace_id = %trace_id, error = %err, "response already written, error not sent");
    } else {
        ctx.respond(&err.response_body(), err.status())?;
    }

    match err {
        AppError::Shutdown(reason) => Err(AppError::Shutdown(reason)),
        _ => Ok(()),
    }
}
