#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use sales_api::modules::users::{MemoryUserRepository, User, UserRepository};
use sales_api::router::init_api;
use sales_api::state::AppState;
use sales_api::web::{App, ShutdownSignal};
use sales_auth::testkeys::{self, PRIMARY_KID};
use sales_auth::{Auth, Claims, ROLE_ADMIN, ROLE_USER};
use sales_config::{AuthConfig, WebConfig};
use sales_core::hash_password;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "gophers";

pub struct TestApp {
    pub repo: Arc<MemoryUserRepository>,
    pub auth: Arc<Auth>,
    pub shutdown: ShutdownSignal,
    pub admin: User,
    pub user: User,
    pub other: User,
}

impl TestApp {
    /// An API over an in-memory repository seeded with one admin and two
    /// regular users, all sharing [`PASSWORD`].
    pub async fn new() -> Self {
        let repo = Arc::new(MemoryUserRepository::new());
        let hash = hash_password(PASSWORD).unwrap();

        let admin = seed(&repo, "admin@example.com", &[ROLE_ADMIN, ROLE_USER], &hash).await;
        let user = seed(&repo, "user@example.com", &[ROLE_USER], &hash).await;
        let other = seed(&repo, "other@example.com", &[ROLE_USER], &hash).await;

        let auth = Arc::new(Auth::new(PRIMARY_KID, testkeys::store()).unwrap());

        Self {
            repo,
            auth,
            shutdown: ShutdownSignal::new(),
            admin,
            user,
            other,
        }
    }

    pub fn app(&self) -> App {
        let state = AppState {
            users: self.repo.clone(),
            auth: Arc::clone(&self.auth),
            auth_config: AuthConfig::default(),
            web_config: WebConfig::default(),
            shutdown: self.shutdown.clone(),
        };
        init_api(state)
    }

    pub fn router(&self) -> Router {
        self.app().into_router()
    }

    /// Signs a token for `user` without going through the token endpoint.
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(
            "service project",
            user.id.to_string(),
            user.roles.clone(),
            Utc::now(),
            Duration::from_secs(3600),
        );
        self.auth.issue(&claims).unwrap()
    }

    pub async fn stored(&self, id: Uuid) -> Option<User> {
        self.repo.query_by_id(id).await.ok()
    }
}

async fn seed(repo: &MemoryUserRepository, email: &str, roles: &[&str], hash: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        password_hash: hash.to_string(),
        date_created: now,
        date_updated: now,
    };
    repo.create(&user).await.unwrap();
    user
}

/// Sends one request and returns the status and the JSON body (`Null` when
/// the body is empty).
pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
