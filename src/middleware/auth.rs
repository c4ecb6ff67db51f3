use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderMap, header},
};
use sales_auth::Auth;
use sales_core::AppError;
use tracing::debug;

use crate::metrics;
use crate::web::{Context, Handler, Middleware, handler};

/// Message for every authentication failure; the cause is only logged.
pub const UNAUTHORIZED_MESSAGE: &str = "invalid or expired token";

/// Route middleware that parses `Authorization: Bearer <token>` into claims
/// on the context. Requests without a valid token never reach the handler.
pub fn authenticate(auth: Arc<Auth>) -> Middleware {
    Middleware::new("authenticate", move |next: Handler| {
        let auth = Arc::clone(&auth);
        handler(move |ctx: Context, req: Request| {
            let next = Arc::clone(&next);
            let auth = Arc::clone(&auth);
            async move {
                let token = bearer_token(req.headers())
                    .ok_or_else(|| {
                        AppError::unauthorized("expected authorization header format: Bearer <token>")
                    })?
                    .to_owned();

                let claims = match auth.parse(&token) {
                    Ok(claims) => claims,
                    Err(err) => {
                        debug!(trace_id = %ctx.trace_id(), error = %err, "token rejected");
                        metrics::track_jwt_validation(false);
                        return Err(AppError::unauthorized(UNAUTHORIZED_MESSAGE));
                    }
                };
                metrics::track_jwt_validation(true);

                next(ctx.with_claims(claims), req).await
            }
        })
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
