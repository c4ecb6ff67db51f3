//! Signing and verification of access tokens.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use thiserror::Error;

use crate::claims::Claims;
use crate::keys::KeyStore;

const ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token header has no kid")]
    MissingKid,
    #[error("unknown kid {0}")]
    UnknownKid(String),
    #[error("no signing key for kid {0}")]
    SigningKeyUnavailable(String),
    #[error("token expired")]
    Expired,
    #[error("token used before issued")]
    NotYetValid,
    #[error("token has no subject")]
    EmptySubject,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Token codec over an immutable [`KeyStore`].
///
/// New tokens are signed with the active key id. Tokens are verified with
/// whichever key their header names, so every key id left in the store stays
/// verifiable after the active id rotates.
#[derive(Debug, Clone)]
pub struct Auth {
    active_kid: String,
    keys: Arc<KeyStore>,
    validation: Validation,
}

impl Auth {
    pub fn new(active_kid: impl Into<String>, keys: KeyStore) -> Result<Self, AuthError> {
        let active_kid = active_kid.into();
        if !keys.can_sign(&active_kid) {
            return Err(AuthError::SigningKeyUnavailable(active_kid));
        }

        // Expiry is checked by hand below: exclusive and without leeway.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string(), "iss".to_string()]);

        Ok(Self {
            active_kid,
            keys: Arc::new(keys),
            validation,
        })
    }

    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Signs `claims` with the active key.
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        let key = self
            .keys
            .signing_key(&self.active_kid)
            .ok_or_else(|| AuthError::SigningKeyUnavailable(self.active_kid.clone()))?;

        let mut header = Header::new(ALGORITHM);
        header.kid = Some(self.active_kid.clone());

        Ok(encode(&header, claims, key)?)
    }

    /// Verifies `token` against the current wall clock.
    pub fn parse(&self, token: &str) -> Result<Claims, AuthError> {
        self.parse_at(token, Utc::now().timestamp())
    }

    /// Verifies `token` as of `now` (unix seconds).
    pub fn parse_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKid)?;
        let key = self
            .keys
            .verifying_key(&kid)
            .ok_or_else(|| AuthError::UnknownKid(kid.clone()))?;

        let claims = decode::<Claims>(token, key, &self.validation)?.claims;

        if now >= claims.exp {
            return Err(AuthError::Expired);
        }
        if now < claims.iat {
            return Err(AuthError::NotYetValid);
        }
        if claims.sub.is_empty() {
            return Err(AuthError::EmptySubject);
        }

        Ok(claims)
    }
}
