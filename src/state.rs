use std::sync::Arc;

use sales_auth::Auth;
use sales_config::{AuthConfig, WebConfig};

use crate::modules::users::UserRepository;
use crate::web::ShutdownSignal;

/// Everything the API routes depend on, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<Auth>,
    pub auth_config: AuthConfig,
    pub web_config: WebConfig,
    pub shutdown: ShutdownSignal,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        auth: Auth,
        auth_config: AuthConfig,
        web_config: WebConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            users,
            auth: Arc::new(auth),
            auth_config,
            web_config,
            shutdown,
        }
    }
}
