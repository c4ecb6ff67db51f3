//! Standard middleware.
//!
//! The app-wide chain is [`standard`]: `logger → panics → errors`, outermost
//! first. Protected routes add [`auth::authenticate`] as route middleware, so
//! it always runs inside error translation. Role and ownership rules are not
//! middleware; handlers call [`authorize`] themselves.

pub mod auth;
pub mod authorize;
pub mod errors;
pub mod logging;
pub mod panics;

use crate::web::Middleware;

/// App-wide middleware in execution order.
pub fn standard() -> Vec<Middleware> {
    vec![logging::logger(), panics::panics(), errors::errors()]
}
