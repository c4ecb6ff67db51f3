use std::sync::Arc;

use crate::middleware::{auth::authenticate, standard};
use crate::modules::users::{UserHandlers, UserService, init_users_routes};
use crate::state::AppState;
use crate::web::App;

/// Builds the API application: the standard middleware chain on every
/// route, bearer authentication on every protected route.
pub fn init_api(state: AppState) -> App {
    let mut app = App::new(state.shutdown.clone(), standard())
        .request_timeout(state.web_config.write_timeout);

    let service = UserService::new(
        Arc::clone(&state.users),
        state.auth_config.issuer.clone(),
        state.auth_config.token_ttl,
    );
    let handlers = Arc::new(UserHandlers::new(service, Arc::clone(&state.auth)));
    init_users_routes(&mut app, handlers, authenticate(Arc::clone(&state.auth)));

    app
}
