//! Authorization payload carried by a signed token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role granting access to every user and administrative operation.
pub const ROLE_ADMIN: &str = "ADMIN";
/// Role granted to every registered user.
pub const ROLE_USER: &str = "USER";

/// Claims embedded in a signed access token.
///
/// Timestamps are unix seconds. A parsed value always satisfies
/// `iat <= now < exp` at the moment it was parsed and has a non-empty `sub`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer of the token
    pub iss: String,
    /// Subject: the authenticated user's id
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiry, exclusive
    pub exp: i64,
    pub roles: Vec<String>,
}

impl Claims {
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        roles: Vec<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = now.timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat,
            exp: iat.saturating_add(ttl),
            roles,
        }
    }

    /// True iff the role set contains `role`.
    pub fn authorized(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn authorized_any(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.authorized(role))
    }

    pub fn is_admin(&self) -> bool {
        self.authorized(ROLE_ADMIN)
    }

    /// Ownership rule: admins may act on anyone, everyone else only on themselves.
    pub fn owns_or_admin(&self, subject: &str) -> bool {
        self.is_admin() || self.sub == subject
    }

    /// `iat <= now < exp`, no leeway.
    pub fn valid_at(&self, now: i64) -> bool {
        self.iat <= now && now < self.exp
    }
}
