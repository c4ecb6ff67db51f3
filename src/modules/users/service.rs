use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sales_auth::Claims;
use sales_core::{FieldErrors, password, validate};
use sales_db::{DbError, with_deadline};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{NewUser, UpdateUser, User};
use super::repository::UserRepository;
use crate::metrics;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("ID is not in its proper form")]
    InvalidId,
    #[error("email is not unique")]
    UniqueEmail,
    #[error("authentication failed")]
    AuthenticationFailure,
    #[error("attempted action is not allowed")]
    Forbidden,
    #[error("validating data: {0}")]
    Validation(FieldErrors),
    #[error("generating password hash: {0}")]
    Password(#[from] password::BcryptError),
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for UserError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            DbError::Duplicate(_) => Self::UniqueEmail,
            other => Self::Db(other),
        }
    }
}

/// Business rules for users: validation, hashing, ownership and
/// credential checks. Every repository call is bounded by the caller's
/// deadline.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    issuer: String,
    token_ttl: Duration,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, issuer: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            repo,
            issuer: issuer.into(),
            token_ttl,
        }
    }

    #[instrument(skip_all, fields(email = %nu.email))]
    pub async fn create(&self, nu: NewUser, now: DateTime<Utc>, deadline: Instant) -> Result<User, UserError> {
        validate::check(&nu).map_err(UserError::Validation)?;

        let hash = password::hash_password(&nu.password)?;
        let user = User {
            id: Uuid::new_v4(),
            name: nu.name,
            email: nu.email,
            roles: nu.roles,
            password_hash: hash,
            date_created: now,
            date_updated: now,
        };

        with_deadline(deadline, self.repo.create(&user)).await?;
        metrics::track_user_created();
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn update(
        &self,
        claims: &Claims,
        user_id: &str,
        uu: UpdateUser,
        now: DateTime<Utc>,
        deadline: Instant,
    ) -> Result<(), UserError> {
        validate::check_id(user_id).map_err(|_| UserError::InvalidId)?;
        uu.check().map_err(UserError::Validation)?;

        let mut user = self.query_by_id(claims, user_id, deadline).await?;

        if let Some(name) = uu.name {
            user.name = name;
        }
        if let Some(email) = uu.email {
            user.email = email;
        }
        if let Some(roles) = uu.roles {
            user.roles = roles;
        }
        if let Some(pw) = uu.password {
            user.password_hash = password::hash_password(&pw)?;
        }
        user.date_updated = now;

        with_deadline(deadline, self.repo.update(&user)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete(&self, claims: &Claims, user_id: &str, deadline: Instant) -> Result<(), UserError> {
        let id = validate::check_id(user_id).map_err(|_| UserError::InvalidId)?;

        if !claims.owns_or_admin(&id.to_string()) {
            return Err(UserError::Forbidden);
        }

        with_deadline(deadline, self.repo.delete(id)).await?;
        Ok(())
    }

    /// Lists users ordered by id. `page` starts at 1.
    pub async fn query(&self, page: u32, rows_per_page: u32, deadline: Instant) -> Result<Vec<User>, UserError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(rows_per_page);
        let users = with_deadline(deadline, self.repo.query(offset, i64::from(rows_per_page))).await?;
        Ok(users)
    }

    /// Ownership is checked before the lookup, so a forbidden caller learns
    /// nothing about whether the id exists.
    pub async fn query_by_id(&self, claims: &Claims, user_id: &str, deadline: Instant) -> Result<User, UserError> {
        let id = validate::check_id(user_id).map_err(|_| UserError::InvalidId)?;

        if !claims.owns_or_admin(&id.to_string()) {
            return Err(UserError::Forbidden);
        }

        Ok(with_deadline(deadline, self.repo.query_by_id(id)).await?)
    }

    /// Verifies an email/password pair and returns the claims to sign.
    ///
    /// An unknown email and a wrong password are indistinguishable to the
    /// caller.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn authenticate(
        &self,
        now: DateTime<Utc>,
        email: &str,
        password: &str,
        deadline: Instant,
    ) -> Result<Claims, UserError> {
        let user = match with_deadline(deadline, self.repo.query_by_email(email)).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                metrics::track_user_login_failure("unknown_email");
                return Err(UserError::AuthenticationFailure);
            }
            Err(err) => return Err(err.into()),
        };

        if !password::verify_password(password, &user.password_hash)? {
            metrics::track_user_login_failure("bad_password");
            return Err(UserError::AuthenticationFailure);
        }

        metrics::track_user_login_success();
        Ok(Claims::new(
            self.issuer.clone(),
            user.id.to_string(),
            user.roles,
            now,
            self.token_ttl,
        ))
    }
}
