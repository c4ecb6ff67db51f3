//! Key-id addressed RSA key material.
//!
//! A [`KeyStore`] is built once at startup and never mutated afterwards. Each
//! key id maps to a public verification key and, for keys this process may
//! sign with, the matching private key. Retired key ids can be kept as
//! public-only entries so tokens they signed stay verifiable during rotation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;
use tracing::info;

const PUBLIC_SUFFIX: &str = ".pub.pem";
const PRIVATE_SUFFIX: &str = ".pem";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("kid {kid}: {source}")]
    Pem {
        kid: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("kid {0}: private key without a public key")]
    MissingPublic(String),
    #[error("no keys found in {0}")]
    Empty(PathBuf),
}

struct KeyPair {
    signing: Option<EncodingKey>,
    verifying: DecodingKey,
}

#[derive(Default)]
pub struct KeyStore {
    keys: HashMap<String, KeyPair>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids: Vec<_> = self.keys.keys().collect();
        kids.sort();
        f.debug_struct("KeyStore").field("kids", &kids).finish()
    }
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key id able to both sign and verify.
    pub fn insert_pem(
        &mut self,
        kid: impl Into<String>,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<(), KeyError> {
        let kid = kid.into();
        let signing = EncodingKey::from_rsa_pem(private_pem).map_err(|source| KeyError::Pem {
            kid: kid.clone(),
            source,
        })?;
        let verifying = decoding_key(&kid, public_pem)?;
        self.keys.insert(
            kid,
            KeyPair {
                signing: Some(signing),
                verifying,
            },
        );
        Ok(())
    }

    /// Adds a verify-only key id.
    pub fn insert_public_pem(
        &mut self,
        kid: impl Into<String>,
        public_pem: &[u8],
    ) -> Result<(), KeyError> {
        let kid = kid.into();
        let verifying = decoding_key(&kid, public_pem)?;
        self.keys.insert(
            kid,
            KeyPair {
                signing: None,
                verifying,
            },
        );
        Ok(())
    }

    /// Loads every `<kid>.pub.pem` in `folder`, pairing it with `<kid>.pem`
    /// when that file exists.
    pub fn from_dir(folder: impl AsRef<Path>) -> Result<Self, KeyError> {
        let folder = folder.as_ref();
        let entries = fs::read_dir(folder).map_err(|source| KeyError::Io {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut publics = Vec::new();
        let mut privates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| KeyError::Io {
                path: folder.to_path_buf(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(kid) = name.strip_suffix(PUBLIC_SUFFIX) {
                publics.push(kid.to_string());
            } else if let Some(kid) = name.strip_suffix(PRIVATE_SUFFIX) {
                privates.push(kid.to_string());
            }
        }

        if let Some(orphan) = privates.iter().find(|kid| !publics.contains(kid)) {
            return Err(KeyError::MissingPublic(orphan.clone()));
        }

        let mut store = Self::new();
        for kid in publics {
            let public = read(&folder.join(format!("{kid}{PUBLIC_SUFFIX}")))?;
            if privates.contains(&kid) {
                let private = read(&folder.join(format!("{kid}{PRIVATE_SUFFIX}")))?;
                store.insert_pem(kid.clone(), &private, &public)?;
            } else {
                store.insert_public_pem(kid.clone(), &public)?;
            }
            info!(kid = %kid, signing = store.can_sign(&kid), "loaded key");
        }

        if store.is_empty() {
            return Err(KeyError::Empty(folder.to_path_buf()));
        }
        Ok(store)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn can_sign(&self, kid: &str) -> bool {
        self.signing_key(kid).is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn signing_key(&self, kid: &str) -> Option<&EncodingKey> {
        self.keys.get(kid).and_then(|pair| pair.signing.as_ref())
    }

    pub(crate) fn verifying_key(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid).map(|pair| &pair.verifying)
    }
}

fn decoding_key(kid: &str, pem: &[u8]) -> Result<DecodingKey, KeyError> {
    DecodingKey::from_rsa_pem(pem).map_err(|source| KeyError::Pem {
        kid: kid.to_string(),
        source,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, KeyError> {
    fs::read(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })
}
