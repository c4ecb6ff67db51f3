use std::sync::Arc;

use axum::http::Method;

use super::controller::UserHandlers;
use crate::web::{App, Middleware, with_state};

/// Registers the `/v1/users` routes. `authn` guards every route except
/// token issuance.
pub fn init_users_routes(app: &mut App, handlers: Arc<UserHandlers>, authn: Middleware) {
    let authn = [authn];

    app.handle(
        Method::POST,
        "/v1/users/token",
        with_state(handlers.clone(), UserHandlers::token),
        &[],
    );
    app.handle(
        Method::GET,
        "/v1/users/{page}/{rows}",
        with_state(handlers.clone(), UserHandlers::query),
        &authn,
    );
    app.handle(
        Method::GET,
        "/v1/users/{id}",
        with_state(handlers.clone(), UserHandlers::query_by_id),
        &authn,
    );
    app.handle(
        Method::POST,
        "/v1/users",
        with_state(handlers.clone(), UserHandlers::create),
        &authn,
    );
    app.handle(
        Method::PATCH,
        "/v1/users/{id}",
        with_state(handlers.clone(), UserHandlers::update),
        &authn,
    );
    app.handle(
        Method::PUT,
        "/v1/users/{id}",
        with_state(handlers.clone(), UserHandlers::update),
        &authn,
    );
    app.handle(
        Method::DELETE,
        "/v1/users/{id}",
        with_state(handlers, UserHandlers::delete),
        &authn,
    );
}
