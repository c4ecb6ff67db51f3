use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::Request;
use futures_util::FutureExt;
use sales_core::AppError;
use tracing::error;

use super::errors::translate;
use crate::metrics;
use crate::web::{Context, Handler, Middleware, handler};

/// Contains panics from the inner chain.
///
/// A panic becomes an unclassified error and is answered with a generic 500
/// through the same translation the error middleware uses. The connection
/// and the process keep going.
pub fn panics() -> Middleware {
    Middleware::new("panics", |next: Handler| {
        handler(move |ctx: Context, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let inner = ctx.clone();
                let outcome = AssertUnwindSafe(async move { next(inner, req).await })
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(trace_id = %ctx.trace_id(), panic = %message, "request panicked");
                        metrics::track_panic();
                        translate(&ctx, AppError::internal(anyhow!("panic: {message}")))
                    }
                }
            }
        })
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
