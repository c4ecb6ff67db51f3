//! RSA key pairs for tests. Never use these outside tests.

pub const PRIMARY_KID: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";
pub const PRIMARY_PRIVATE: &str =
    include_str!("../testdata/54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pem");
pub const PRIMARY_PUBLIC: &str =
    include_str!("../testdata/54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pub.pem");

pub const SECONDARY_KID: &str = "8c4b2e57-6f0a-4a8e-9a52-2c3c8e6a1d10";
pub const SECONDARY_PRIVATE: &str =
    include_str!("../testdata/8c4b2e57-6f0a-4a8e-9a52-2c3c8e6a1d10.pem");
pub const SECONDARY_PUBLIC: &str =
    include_str!("../testdata/8c4b2e57-6f0a-4a8e-9a52-2c3c8e6a1d10.pub.pem");

/// A store holding both test pairs with signing enabled.
pub fn store() -> crate::KeyStore {
    let mut store = crate::KeyStore::new();
    store
        .insert_pem(PRIMARY_KID, PRIMARY_PRIVATE.as_bytes(), PRIMARY_PUBLIC.as_bytes())
        .expect("primary test key");
    store
        .insert_pem(
            SECONDARY_KID,
            SECONDARY_PRIVATE.as_bytes(),
            SECONDARY_PUBLIC.as_bytes(),
        )
        .expect("secondary test key");
    store
}
