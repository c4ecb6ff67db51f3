pub mod controller;
pub mod model;
pub mod repository;
pub mod router;
pub mod service;

pub use controller::UserHandlers;
pub use model::*;
pub use repository::{PgUserRepository, UserRepository};
pub use router::init_users_routes;
pub use service::{UserError, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use repository::MemoryUserRepository;
