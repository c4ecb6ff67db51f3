//! Per-request state passed explicitly through the middleware chain.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use sales_auth::Claims;
use sales_core::AppError;
use serde::Serialize;
use uuid::Uuid;

use super::respond::ResponseWriter;

/// Values fixed at the moment the request entered the app.
#[derive(Debug)]
pub struct Values {
    pub trace_id: String,
    pub now: DateTime<Utc>,
    pub started: Instant,
    /// Downstream work past this point must be abandoned.
    pub deadline: tokio::time::Instant,
    pub method: Method,
    /// Route pattern the request matched, e.g. `/v1/users/{id}`.
    pub route: String,
}

/// A request's context. Cloning is cheap and every clone shares the same
/// [`ResponseWriter`]. Authentication adds claims by producing a new value
/// with [`Context::with_claims`].
#[derive(Clone)]
pub struct Context {
    values: Arc<Values>,
    params: Arc<HashMap<String, String>>,
    claims: Option<Arc<Claims>>,
    writer: ResponseWriter,
}

impl Context {
    pub fn new(
        method: Method,
        route: impl Into<String>,
        params: HashMap<String, String>,
        timeout: Duration,
    ) -> Self {
        let started = Instant::now();
        Self {
            values: Arc::new(Values {
                trace_id: Uuid::new_v4().to_string(),
                now: Utc::now(),
                started,
                deadline: tokio::time::Instant::from_std(started + timeout),
                method,
                route: route.into(),
            }),
            params: Arc::new(params),
            claims: None,
            writer: ResponseWriter::new(),
        }
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn trace_id(&self) -> &str {
        &self.values.trace_id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.values.now
    }

    pub fn deadline(&self) -> tokio::time::Instant {
        self.values.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.values.started.elapsed()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Claims of the authenticated caller.
    ///
    /// Reaching a handler without claims means the route was registered
    /// without authentication, so the process asks to be restarted.
    pub fn claims(&self) -> Result<&Claims, AppError> {
        self.claims
            .as_deref()
            .ok_or_else(|| AppError::shutdown("claims missing from context"))
    }

    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.claims = Some(Arc::new(claims));
        self
    }

    pub fn respond<T>(&self, data: &T, status: StatusCode) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        self.writer.respond(data, status)
    }

    pub fn is_started(&self) -> bool {
        self.writer.is_started()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.writer.status()
    }

    pub(crate) fn writer(&self) -> &ResponseWriter {
        &self.writer
    }
}
