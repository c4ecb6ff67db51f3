use std::time::Duration;

use crate::{ConfigError, Vars};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Folder holding `<kid>.pem` private keys and `<kid>.pub.pem` public keys.
    pub keys_folder: String,
    /// Key id used to sign new tokens.
    pub active_kid: String,
    pub issuer: String,
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys_folder: "zarf/keys/".to_string(),
            active_kid: "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1".to_string(),
            issuer: "service project".to_string(),
            token_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl AuthConfig {
    pub(crate) fn load(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            keys_folder: vars.string("AUTH_KEYS_FOLDER", &defaults.keys_folder),
            active_kid: vars.string("AUTH_ACTIVE_KID", &defaults.active_kid),
            issuer: vars.string("AUTH_ISSUER", &defaults.issuer),
            token_ttl: vars.duration("AUTH_TOKEN_TTL", defaults.token_ttl)?,
        })
    }
}
