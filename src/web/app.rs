//! Route registration and request dispatch.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    Router,
    extract::{FromRequestParts, Path, Request},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter},
};
use sales_core::{AppError, ErrorResponse};
use tracing::{error, warn};

use super::context::Context;
use super::lifecycle::Lifecycle;
use super::middleware::{Handler, Middleware, stage_names, wrap_middleware};
use super::shutdown::ShutdownSignal;

/// Default per-request deadline when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The request dispatcher.
///
/// Every route's middleware chain is built once, in [`App::handle`]: route
/// middleware wraps the handler first and the app-wide middleware wraps the
/// result, so app-wide stages always run outermost.
pub struct App {
    routes: BTreeMap<String, MethodRouter>,
    mw: Vec<Middleware>,
    shutdown: ShutdownSignal,
    lifecycle: Lifecycle,
    request_timeout: Duration,
}

impl App {
    pub fn new(shutdown: ShutdownSignal, mw: Vec<Middleware>) -> Self {
        Self {
            routes: BTreeMap::new(),
            mw,
            shutdown,
            lifecycle: Lifecycle::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline given to each request's context.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn context_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Registers `handler` for `method` on `path` (axum syntax, `{param}`).
    ///
    /// # Panics
    ///
    /// Panics if `method` is not one axum can route, like axum's own
    /// registration does for invalid routes.
    pub fn handle(&mut self, method: Method, path: &str, handler: Handler, route_mw: &[Middleware]) {
        let filter = MethodFilter::try_from(method.clone())
            .unwrap_or_else(|_| panic!("unsupported method {method} for {path}"));

        let chain = wrap_middleware(&self.mw, wrap_middleware(route_mw, handler));
        tracing::debug!(
            method = %method,
            path,
            stages = ?[stage_names(&self.mw), stage_names(route_mw)].concat(),
            "route registered"
        );

        let dispatch = Arc::new(Dispatch {
            route: path.to_string(),
            chain,
            shutdown: self.shutdown.clone(),
            lifecycle: self.lifecycle.clone(),
            request_timeout: self.request_timeout,
        });
        let endpoint = move |req: Request| {
            let dispatch = Arc::clone(&dispatch);
            async move { dispatch.run(req).await }
        };

        let entry = self.routes.remove(path).unwrap_or_else(MethodRouter::new);
        self.routes.insert(path.to_string(), entry.on(filter, endpoint));
    }

    /// Builds the axum router. Unknown paths receive a JSON 404.
    pub fn into_router(self) -> Router {
        let router = self
            .routes
            .into_iter()
            .fold(Router::new(), |router, (path, methods)| {
                router.route(&path, methods)
            });
        router.fallback(not_found)
    }
}

async fn not_found() -> Response {
    error_response(&AppError::not_found("route not found"))
}

fn error_response(err: &AppError) -> Response {
    (err.status(), axum::Json(err.response_body())).into_response()
}

struct Dispatch {
    route: String,
    chain: Handler,
    shutdown: ShutdownSignal,
    lifecycle: Lifecycle,
    request_timeout: Duration,
}

impl Dispatch {
    async fn run(&self, req: Request) -> Response {
        if self.lifecycle.is_draining() {
            return error_response(&AppError::shutdown("draining"));
        }

        let (mut parts, body) = req.into_parts();
        let params = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, &()).await {
            Ok(Path(params)) => params,
            Err(_) => HashMap::new(),
        };
        let method = parts.method.clone();
        let req = Request::from_parts(parts, body);

        let ctx = Context::new(method, self.route.clone(), params, self.request_timeout);

        if let Err(err) = (self.chain)(ctx.clone(), req).await {
            self.escaped(&ctx, err);
        }

        match ctx.writer().take() {
            Some(response) => response,
            None if ctx.is_started() => {
                // Only reachable if something already took the response.
                error_response(&AppError::internal(anyhow!("response taken twice")))
            }
            None => StatusCode::OK.into_response(),
        }
    }

    /// An error reached the top of the chain. The error middleware already
    /// wrote a response for anything it saw; a shutdown error is re-raised
    /// here on purpose.
    fn escaped(&self, ctx: &Context, err: AppError) {
        if let AppError::Shutdown(reason) = &err {
            warn!(trace_id = %ctx.trace_id(), reason = %reason, "handler requested shutdown");
            self.shutdown.trigger(reason.clone());
        } else {
            error!(trace_id = %ctx.trace_id(), error = %err, "error escaped the middleware chain");
        }

        if !ctx.is_started() {
            let body: ErrorResponse = err.response_body();
            if let Err(write_err) = ctx.respond(&body, err.status()) {
                error!(trace_id = %ctx.trace_id(), error = %write_err, "writing fallback response");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::lifecycle::Phase;
    use crate::web::middleware::handler;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_params_reach_the_handler() {
        let mut app = App::new(ShutdownSignal::new(), vec![]);
        app.handle(
            Method::GET,
            "/echo/{word}",
            handler(|ctx: Context, _req| async move {
                let word = ctx.param("word").unwrap_or_default().to_string();
                ctx.respond(&serde_json::json!({ "word": word }), StatusCode::OK)
            }),
            &[],
        );

        let response = app.into_router().oneshot(get("/echo/hi")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["word"], "hi");
    }

    #[tokio::test]
    async fn test_methods_on_same_path_merge() {
        let mut app = App::new(ShutdownSignal::new(), vec![]);
        app.handle(
            Method::GET,
            "/thing",
            handler(|ctx: Context, _req| async move { ctx.respond(&"get", StatusCode::OK) }),
            &[],
        );
        app.handle(
            Method::DELETE,
            "/thing",
            handler(|ctx: Context, _req| async move { ctx.respond(&(), StatusCode::NO_CONTENT) }),
            &[],
        );
        let router = app.into_router();

        let response = router.clone().oneshot(get("/thing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/thing")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = App::new(ShutdownSignal::new(), vec![]);
        let response = app.into_router().oneshot(get("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["error"], "route not found");
    }

    #[tokio::test]
    async fn test_silent_handler_yields_empty_200() {
        let mut app = App::new(ShutdownSignal::new(), vec![]);
        app.handle(Method::GET, "/quiet", handler(|_ctx, _req| async { Ok(()) }), &[]);
        let response = app.into_router().oneshot(get("/quiet")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_escaped_error_gets_fallback_response() {
        let mut app = App::new(ShutdownSignal::new(), vec![]);
        app.handle(
            Method::GET,
            "/fail",
            handler(|_ctx, _req| async { Err(AppError::internal(anyhow!("db password is hunter2"))) }),
            &[],
        );
        let response = app.into_router().oneshot(get("/fail")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["error"], sales_core::errors::INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_shutdown_error_triggers_signal_and_503() {
        let shutdown = ShutdownSignal::new();
        let mut app = App::new(shutdown.clone(), vec![]);
        app.handle(
            Method::GET,
            "/stop",
            handler(|_ctx, _req| async { Err(AppError::shutdown("integrity check failed")) }),
            &[],
        );
        let response = app.into_router().oneshot(get("/stop")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(shutdown.reason().as_deref(), Some("integrity check failed"));
    }

    #[tokio::test]
    async fn test_draining_rejects_new_requests() {
        let mut app = App::new(ShutdownSignal::new(), vec![]);
        app.handle(
            Method::GET,
            "/ok",
            handler(|ctx: Context, _req| async move { ctx.respond(&"ok", StatusCode::OK) }),
            &[],
        );
        let lifecycle = app.lifecycle().clone();
        let router = app.into_router();

        lifecycle.advance(Phase::Serving);
        let response = router.clone().oneshot(get("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        lifecycle.advance(Phase::Draining);
        let response = router.oneshot(get("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
