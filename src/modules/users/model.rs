use chrono::{DateTime, Utc};
use sales_auth::{ROLE_ADMIN, ROLE_USER};
use sales_core::{FieldError, FieldErrors, validate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A stored user. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "name is a required field"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "roles is a required field"),
        custom(function = "validate_roles")
    )]
    pub roles: Vec<String>,
    #[validate(length(min = 1, message = "password is a required field"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "password_confirm must match password"))]
    pub password_confirm: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_roles"))]
    pub roles: Option<Vec<String>>,
    #[validate(length(min = 1, message = "password cannot be empty"))]
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

impl UpdateUser {
    /// Runs the field rules, then checks that a supplied `password_confirm`
    /// equals `password`. Both fields are optional, so the rule cannot be a
    /// field-level `must_match`.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match validate::check(self) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.into_inner(),
        };

        if self.password_confirm.is_some() && self.password_confirm != self.password {
            errors.push(FieldError::new(
                "password_confirm",
                "password_confirm must match password",
            ));
        }

        match FieldErrors::new(errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is a required field"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn validate_roles(roles: &[String]) -> Result<(), ValidationError> {
    let known = roles
        .iter()
        .all(|role| role == ROLE_ADMIN || role == ROLE_USER);
    if known {
        Ok(())
    } else {
        let mut err = ValidationError::new("roles");
        err.message = Some("roles must be ADMIN or USER".into());
        Err(err)
    }
}
