//! Authorization checks invoked by handlers.
//!
//! These are not middleware: which role or owner a request needs depends on
//! the resource it touches, so handlers call them after loading what they
//! need. Failing checks are `403`, distinct from the `401` of a missing or
//! invalid token.

use sales_auth::Claims;
use sales_core::AppError;

pub const FORBIDDEN_MESSAGE: &str = "you are not authorized for that action";

/// Passes if the caller holds any of `roles`.
pub fn require_role(claims: &Claims, roles: &[&str]) -> Result<(), AppError> {
    if claims.authorized_any(roles) {
        Ok(())
    } else {
        Err(AppError::forbidden(FORBIDDEN_MESSAGE))
    }
}

/// Passes if the caller is an admin or is `subject`.
pub fn require_owner_or_admin(claims: &Claims, subject: &str) -> Result<(), AppError> {
    if claims.owns_or_admin(subject) {
        Ok(())
    } else {
        Err(AppError::forbidden(FORBIDDEN_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sales_auth::{ROLE_ADMIN, ROLE_USER};

    fn claims(sub: &str, roles: &[&str]) -> Claims {
        Claims {
            iss: "service project".into(),
            sub: sub.into(),
            iat: 0,
            exp: 60,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&claims("u1", &[ROLE_ADMIN]), &[ROLE_ADMIN]).is_ok());
        let err = require_role(&claims("u1", &[ROLE_USER]), &[ROLE_ADMIN]).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require_owner_or_admin() {
        assert!(require_owner_or_admin(&claims("u1", &[ROLE_USER]), "u1").is_ok());
        assert!(require_owner_or_admin(&claims("admin", &[ROLE_ADMIN]), "u1").is_ok());
        let err = require_owner_or_admin(&claims("u2", &[ROLE_USER]), "u1").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
