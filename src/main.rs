use std::sync::Arc;

use anyhow::Context as _;
use sales_api::debug::{DebugState, serve_debug};
use sales_api::logging::{init_panic_hook, init_tracing};
use sales_api::metrics::init_metrics;
use sales_api::modules::users::PgUserRepository;
use sales_api::router::init_api;
use sales_api::state::AppState;
use sales_api::web::{ShutdownSignal, serve};
use sales_auth::{Auth, KeyStore};
use sales_config::Config;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = ?err, "startup failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    init_tracing(config.log_format);
    init_panic_hook();
    info!(config = %config, "starting sales-api");

    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "metrics recorder not installed");
            None
        }
    };

    let keys = KeyStore::from_dir(&config.auth.keys_folder)
        .with_context(|| format!("loading keys from {}", config.auth.keys_folder))?;
    let auth = Auth::new(config.auth.active_kid.clone(), keys).context("constructing auth")?;

    let db = sales_db::connect(&config.db).context("connecting to database")?;

    let shutdown = ShutdownSignal::with_os_signals();
    let state = AppState::new(
        Arc::new(PgUserRepository::new(db.clone())),
        auth,
        config.auth.clone(),
        config.web.clone(),
        shutdown,
    );
    let app = init_api(state);

    let debug_listener = TcpListener::bind(&config.web.debug_host)
        .await
        .with_context(|| format!("binding debug host {}", config.web.debug_host))?;
    let debug = tokio::spawn(serve_debug(
        debug_listener,
        DebugState {
            lifecycle: app.lifecycle().clone(),
            db: Some(db.clone()),
            metrics,
        },
    ));

    let listener = TcpListener::bind(&config.web.api_host)
        .await
        .with_context(|| format!("binding api host {}", config.web.api_host))?;

    let result = serve(listener, app, &config.web).await;

    debug.abort();
    db.close().await;
    result.context("serving api")?;

    info!("shutdown complete");
    Ok(())
}
