use std::sync::Arc;

use axum::{extract::Request, http::StatusCode};
use sales_auth::{Auth, ROLE_ADMIN};
use sales_core::{AppError, validate};

use super::model::{Credentials, NewUser, TokenResponse, UpdateUser};
use super::service::{UserError, UserService};
use crate::metrics;
use crate::middleware::authorize::{FORBIDDEN_MESSAGE, require_owner_or_admin, require_role};
use crate::web::{Context, HandlerResult, decode};

/// Handlers for the `/v1/users` routes.
pub struct UserHandlers {
    service: UserService,
    auth: Arc<Auth>,
}

impl UserHandlers {
    pub fn new(service: UserService, auth: Arc<Auth>) -> Self {
        Self { service, auth }
    }

    /// `POST /v1/users/token`: exchanges an email/password pair for a token.
    pub async fn token(self: Arc<Self>, ctx: Context, req: Request) -> HandlerResult {
        let creds: Credentials = decode(req).await?;
        validate::check(&creds).map_err(AppError::fields)?;

        let claims = self
            .service
            .authenticate(ctx.now(), &creds.email, &creds.password, ctx.deadline())
            .await
            .map_err(app_error)?;

        let token = self.auth.issue(&claims)?;
        metrics::track_jwt_issued();

        ctx.respond(&TokenResponse { token }, StatusCode::OK)
    }

    /// `GET /v1/users/{page}/{rows}`
    pub async fn query(self: Arc<Self>, ctx: Context, _req: Request) -> HandlerResult {
        require_role(ctx.claims()?, &[ROLE_ADMIN])?;

        let page = positive_param(&ctx, "page")?;
        let rows = positive_param(&ctx, "rows")?;

        let users = self
            .service
            .query(page, rows, ctx.deadline())
            .await
            .map_err(app_error)?;

        ctx.respond(&users, StatusCode::OK)
    }

    /// `GET /v1/users/{id}`
    pub async fn query_by_id(self: Arc<Self>, ctx: Context, _req: Request) -> HandlerResult {
        let claims = ctx.claims()?;
        let id = path_id(&ctx)?;
        require_owner_or_admin(claims, &id)?;

        let user = self
            .service
            .query_by_id(claims, &id, ctx.deadline())
            .await
            .map_err(app_error)?;

        ctx.respond(&user, StatusCode::OK)
    }

    /// `POST /v1/users`
    pub async fn create(self: Arc<Self>, ctx: Context, req: Request) -> HandlerResult {
        require_role(ctx.claims()?, &[ROLE_ADMIN])?;

        let nu: NewUser = decode(req).await?;
        let user = self
            .service
            .create(nu, ctx.now(), ctx.deadline())
            .await
            .map_err(app_error)?;

        ctx.respond(&user, StatusCode::CREATED)
    }

    /// `PATCH|PUT /v1/users/{id}`
    pub async fn update(self: Arc<Self>, ctx: Context, req: Request) -> HandlerResult {
        let claims = ctx.claims()?;
        let id = path_id(&ctx)?;
        require_owner_or_admin(claims, &id)?;

        let uu: UpdateUser = decode(req).await?;
        self.service
            .update(claims, &id, uu, ctx.now(), ctx.deadline())
            .await
            .map_err(app_error)?;

        ctx.respond(&(), StatusCode::NO_CONTENT)
    }

    /// `DELETE /v1/users/{id}`
    pub async fn delete(self: Arc<Self>, ctx: Context, _req: Request) -> HandlerResult {
        let claims = ctx.claims()?;
        let id = path_id(&ctx)?;
        require_owner_or_admin(claims, &id)?;

        self.service
            .delete(claims, &id, ctx.deadline())
            .await
            .map_err(app_error)?;

        ctx.respond(&(), StatusCode::NO_CONTENT)
    }
}

/// The `{id}` path parameter in canonical UUID form, so ownership compares
/// equal however the caller spelled it.
fn path_id(ctx: &Context) -> Result<String, AppError> {
    let raw = ctx.param("id").unwrap_or_default();
    let id = validate::check_id(raw).map_err(|err| AppError::bad_request(err.to_string()))?;
    Ok(id.to_string())
}

fn positive_param(ctx: &Context, name: &str) -> Result<u32, AppError> {
    let raw = ctx.param(name).unwrap_or_default();
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::bad_request(format!("invalid {name} format [{raw}]"))),
    }
}

/// Domain errors become trusted errors; storage and hashing failures stay
/// unclassified so their detail is never sent to the caller.
fn app_error(err: UserError) -> AppError {
    match err {
        UserError::NotFound => AppError::not_found(err.to_string()),
        UserError::InvalidId => AppError::bad_request(err.to_string()),
        UserError::UniqueEmail => AppError::conflict(err.to_string()),
        UserError::AuthenticationFailure => AppError::unauthorized(err.to_string()),
        UserError::Forbidden => AppError::forbidden(FORBIDDEN_MESSAGE),
        UserError::Validation(fields) => AppError::fields(fields),
        UserError::Db(_) | UserError::Password(_) => AppError::internal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_core::FieldErrors;
    use sales_db::DbError;

    #[test]
    fn test_domain_errors_are_trusted() {
        assert_eq!(app_error(UserError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(app_error(UserError::InvalidId).status(), StatusCode::BAD_REQUEST);
        assert_eq!(app_error(UserError::UniqueEmail).status(), StatusCode::CONFLICT);
        assert_eq!(
            app_error(UserError::AuthenticationFailure).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(app_error(UserError::Forbidden).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_validation_keeps_fields() {
        let err = app_error(UserError::Validation(FieldErrors::single("email", "bad")));
        let body = err.response_body();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body.fields.map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_storage_errors_are_hidden() {
        let err = app_error(UserError::Db(DbError::Timeout));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response_body().error, sales_core::errors::INTERNAL_MESSAGE);
    }
}
