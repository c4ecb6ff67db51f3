//! A small web framework on top of axum.
//!
//! Handlers receive an explicit [`Context`] and write their response through
//! it exactly once. Cross-cutting behaviour is composed as an ordered list
//! of named [`Middleware`] built once per route by [`App::handle`], and
//! [`serve`] drives the `Starting → Serving → Draining → Stopped` lifecycle.

pub mod app;
pub mod context;
pub mod decode;
pub mod lifecycle;
pub mod middleware;
pub mod respond;
pub mod server;
pub mod shutdown;

pub use app::App;
pub use context::{Context, Values};
pub use decode::decode;
pub use lifecycle::{Lifecycle, Phase};
pub use middleware::{Handler, HandlerResult, Middleware, handler, wrap_middleware, with_state};
pub use respond::ResponseWriter;
pub use server::{ServerError, serve};
pub use shutdown::ShutdownSignal;
