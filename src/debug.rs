//! Introspection endpoints served on their own listener.
//!
//! The debug listener is never drained: it keeps answering while the API
//! shuts down, so readiness can report the `draining` phase.

use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use sales_db::{PgPool, status_check, with_deadline};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::web::{Lifecycle, Phase};

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct DebugState {
    pub lifecycle: Lifecycle,
    pub db: Option<PgPool>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn init_debug_router(state: DebugState) -> Router {
    Router::new()
        .route("/debug/liveness", get(liveness))
        .route("/debug/readiness", get(readiness))
        .route("/debug/metrics", get(metrics))
        .with_state(state)
}

/// Runs the debug router until the task is dropped.
pub async fn serve_debug(listener: TcpListener, state: DebugState) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "debug listening");
    axum::serve(listener, init_debug_router(state)).await
}

async fn liveness(State(state): State<DebugState>) -> impl IntoResponse {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string());
    Json(json!({
        "status": "up",
        "build": env!("CARGO_PKG_VERSION"),
        "host": host,
        "pid": std::process::id(),
        "phase": state.lifecycle.phase().as_str(),
    }))
}

async fn readiness(State(state): State<DebugState>) -> impl IntoResponse {
    let phase = state.lifecycle.phase();
    if phase != Phase::Serving {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": phase.as_str() })),
        );
    }

    if let Some(db) = &state.db {
        let deadline = Instant::now() + READINESS_TIMEOUT;
        if let Err(err) = with_deadline(deadline, status_check(db)).await {
            warn!(error = %err, "readiness: database not ready");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "db not ready" })),
            );
        }
    }

    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn metrics(State(state): State<DebugState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router(lifecycle: &Lifecycle) -> Router {
        init_debug_router(DebugState {
            lifecycle: lifecycle.clone(),
            db: None,
            metrics: None,
        })
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_liveness() {
        let lifecycle = Lifecycle::new();
        let (status, body) = get(router(&lifecycle), "/debug/liveness").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "up");
        assert_eq!(body["pid"], std::process::id());
    }

    #[tokio::test]
    async fn test_readiness_follows_lifecycle() {
        let lifecycle = Lifecycle::new();
        let (status, body) = get(router(&lifecycle), "/debug/readiness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "starting");

        lifecycle.advance(Phase::Serving);
        let (status, body) = get(router(&lifecycle), "/debug/readiness").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        lifecycle.advance(Phase::Draining);
        let (status, body) = get(router(&lifecycle), "/debug/readiness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "draining");
    }
}
