//! Handler and middleware composition.
//!
//! A [`Middleware`] turns the next handler into a new handler. A chain is an
//! ordered list of named middleware applied once, at route registration:
//! `wrap_middleware(&[a, b], h)` yields `a(b(h))`, so `a` runs first on the
//! way in and last on the way out.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use futures_util::future::BoxFuture;
use sales_core::AppError;

use super::context::Context;

pub type HandlerResult = Result<(), AppError>;

/// A type-erased, shareable request handler.
pub type Handler = Arc<dyn Fn(Context, Request) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Boxes an async function into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: Context, req: Request| -> BoxFuture<'static, HandlerResult> {
        Box::pin(f(ctx, req))
    })
}

/// Boxes an async function that also receives shared state, typically a
/// handler group's `self: Arc<Self>` method.
pub fn with_state<T, F, Fut>(state: Arc<T>, f: F) -> Handler
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, Context, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler(move |ctx, req| f(Arc::clone(&state), ctx, req))
}

#[derive(Clone)]
pub struct Middleware {
    name: &'static str,
    wrap: Arc<dyn Fn(Handler) -> Handler + Send + Sync>,
}

impl Middleware {
    pub fn new<F>(name: &'static str, wrap: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self {
            name,
            wrap: Arc::new(wrap),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn wrap(&self, next: Handler) -> Handler {
        (self.wrap)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// Wraps `handler` so that `mw[0]` is outermost.
pub fn wrap_middleware(mw: &[Middleware], handler: Handler) -> Handler {
    mw.iter().rev().fold(handler, |next, m| m.wrap(next))
}

/// Names of a chain in execution order.
pub fn stage_names(mw: &[Middleware]) -> Vec<&'static str> {
    mw.iter().map(Middleware::name).collect()
}
