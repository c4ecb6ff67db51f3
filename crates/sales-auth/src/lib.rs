//! # Sales Auth
//!
//! Authentication primitives for the Sales API.
//!
//! - [`claims`]: the authorization payload and role/ownership checks
//! - [`keys`]: RSA key pairs addressed by key id
//! - [`token`]: the [`Auth`] codec issuing and parsing RS256 tokens
//!
//! # Example
//!
//! ```ignore
//! use sales_auth::{Auth, Claims, KeyStore, ROLE_USER};
//!
//! let keys = KeyStore::from_dir("zarf/keys/")?;
//! let auth = Auth::new("54bb2165-71e1-41a6-af3e-7da4a0e1e2c1", keys)?;
//!
//! let claims = Claims::new("service project", user_id, vec![ROLE_USER.into()], Utc::now(), ttl);
//! let token = auth.issue(&claims)?;
//! let parsed = auth.parse(&token)?;
//! assert_eq!(parsed.sub, claims.sub);
//! ```

pub mod claims;
pub mod keys;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod testkeys;

// Re-export commonly used types at crate root
pub use claims::{Claims, ROLE_ADMIN, ROLE_USER};
pub use keys::{KeyError, KeyStore};
pub use token::{Auth, AuthError};
