//! # Sales API
//!
//! An authenticated user CRUD service built on axum and PostgreSQL.
//!
//! ## Overview
//!
//! Requests go through a small framework in [`web`]: every route runs an
//! ordered middleware chain around a handler that receives an explicit
//! [`web::Context`] and writes its response exactly once. The standard chain
//! is:
//!
//! ```text
//! logger → panics → errors → authenticate (protected routes) → handler
//! ```
//!
//! Handlers return [`sales_core::AppError`]. Only the error middleware turns
//! an error into a response, so every failure has the same JSON shape:
//!
//! ```json
//! { "error": "data validation error", "fields": [{ "field": "email", "error": "..." }] }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── web/          # App, Context, middleware composition, serve + drain
//! ├── middleware/   # logger, panics, errors, authenticate, authorize helpers
//! ├── modules/
//! │   └── users/   # model, repository, service, controller, router
//! ├── debug.rs      # liveness, readiness and metrics on the debug listener
//! ├── router.rs     # API assembly
//! └── state.rs      # shared application state
//! ```
//!
//! Workspace crates:
//!
//! - [`sales_core`]: error taxonomy, validation, password hashing
//! - [`sales_config`]: `SALES_*` environment configuration
//! - [`sales_db`]: PostgreSQL pool, query helpers, migrations
//! - [`sales_auth`]: claims, key store, RS256 token codec
//!
//! ## Authentication
//!
//! `POST /v1/users/token` exchanges an email and password for a token signed
//! with the active key id. Every other `/v1` route requires
//! `Authorization: Bearer <token>`. Role and ownership rules are checked by
//! the handlers themselves through [`middleware::authorize`].
//!
//! ## Shutdown
//!
//! SIGINT/SIGTERM, or a handler returning a shutdown error, starts a drain:
//! the listener closes, new requests get 503, and in-flight requests have
//! `SALES_WEB_SHUTDOWN_TIMEOUT` to finish before their connections are
//! closed.

pub mod debug;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod web;

// Re-export workspace crates for convenience
pub use sales_auth;
pub use sales_config;
pub use sales_core;
pub use sales_db;
