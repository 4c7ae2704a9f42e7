//! Client credential derivation.
//!
//! Client identifiers and secrets are built from a prefix, a digest of the
//! application name, a digest of the canonical scope string, and a random salt:
//!
//! ```text
//! client_<H("client-id/application", name)>_<H("client-id/scopes", scopes)>_<salt>
//! secret_<H("client-secret/application", name)>_<H("client-secret/scopes", scopes)>_<salt>
//! ```
//!
//! Identifiers and secrets use different digest labels and independent salts,
//! so a secret shares no component with the identifier it was issued with.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::scope::ScopeSet;

/// Random bytes appended to every client identifier.
pub const CLIENT_ID_SALT_LEN: usize = 8;

/// Random bytes appended to every client secret.
pub const CLIENT_SECRET_SALT_LEN: usize = 24;

/// Number of digest bytes kept per hashed component.
const DIGEST_LEN: usize = 16;

const CLIENT_ID_PREFIX: &str = "client";
const CLIENT_SECRET_PREFIX: &str = "secret";

/// Source of the random salt mixed into derived credentials.
pub trait SaltSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

/// Salt source backed by the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSaltSource;

impl SaltSource for OsSaltSource {
    fn fill(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

/// Derives client identifiers and secrets.
#[derive(Clone)]
pub struct CredentialDeriver {
    salt_source: Arc<dyn SaltSource>,
}

impl Default for CredentialDeriver {
    fn default() -> Self {
        Self::new(Arc::new(OsSaltSource))
    }
}

impl CredentialDeriver {
    pub fn new(salt_source: Arc<dyn SaltSource>) -> Self {
        Self { salt_source }
    }

    /// Derive a fresh client identifier.
    pub fn derive_id(&self, application_name: &str, scopes: &ScopeSet) -> String {
        let mut salt = [0u8; CLIENT_ID_SALT_LEN];
        self.salt_source.fill(&mut salt);
        derive_id_with_salt(application_name, scopes, &salt)
    }

    /// Derive a fresh client secret.
    pub fn derive_secret(&self, application_name: &str, scopes: &ScopeSet) -> String {
        let mut salt = [0u8; CLIENT_SECRET_SALT_LEN];
        self.salt_source.fill(&mut salt);
        derive_secret_with_salt(application_name, scopes, &salt)
    }
}

/// Derive a client identifier from an explicit salt.
pub fn derive_id_with_salt(application_name: &str, scopes: &ScopeSet, salt: &[u8]) -> String {
    compose(CLIENT_ID_PREFIX, "client-id", application_name, scopes, salt)
}

/// Derive a client secret from an explicit salt.
pub fn derive_secret_with_salt(application_name: &str, scopes: &ScopeSet, salt: &[u8]) -> String {
    compose(
        CLIENT_SECRET_PREFIX,
        "client-secret",
        application_name,
        scopes,
        salt,
    )
}

/// Hex-encoded SHA-256 digest of a client secret, as kept by the client store.
pub fn secret_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn compose(
    prefix: &str,
    path: &str,
    application_name: &str,
    scopes: &ScopeSet,
    salt: &[u8],
) -> String {
    format!(
        "{}_{}_{}_{}",
        prefix,
        labelled_digest(&format!("{path}/application"), application_name),
        labelled_digest(&format!("{path}/scopes"), &scopes.to_scope_string()),
        hex::encode(salt)
    )
}

fn labelled_digest(label: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update([0u8]);
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..DIGEST_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(values: &[&str]) -> ScopeSet {
        values.iter().collect()
    }

    #[test]
    fn test_same_salt_is_reproducible() {
        let salt = [7u8; CLIENT_ID_SALT_LEN];
        let a = derive_id_with_salt("billing", &scopes(&["read", "write"]), &salt);
        let b = derive_id_with_salt("billing", &scopes(&["write", "read"]), &salt);
        assert_eq!(a, b);
        assert!(a.starts_with("client_"));
        assert!(a.ends_with("_0707070707070707"));
    }

    #[test]
    fn test_fresh_salt_produces_distinct_credentials() {
        let deriver = CredentialDeriver::default();
        let requested = scopes(&["read"]);

        let id1 = deriver.derive_id("billing", &requested);
        let id2 = deriver.derive_id("billing", &requested);
        assert_ne!(id1, id2);

        let secret1 = deriver.derive_secret("billing", &requested);
        let secret2 = deriver.derive_secret("billing", &requested);
        assert_ne!(secret1, secret2);
        assert!(secret1.starts_with("secret_"));
    }

    #[test]
    fn test_secret_shares_no_component_with_id() {
        let requested = scopes(&["read"]);
        let salt = [1u8; CLIENT_SECRET_SALT_LEN];
        let id = derive_id_with_salt("billing", &requested, &salt[..CLIENT_ID_SALT_LEN]);
        let secret = derive_secret_with_salt("billing", &requested, &salt);

        let id_parts: Vec<&str> = id.split('_').collect();
        let secret_parts: Vec<&str> = secret.split('_').collect();
        assert_eq!(id_parts.len(), 4);
        assert_eq!(secret_parts.len(), 4);
        assert_ne!(id_parts[1], secret_parts[1]);
        assert_ne!(id_parts[2], secret_parts[2]);
        assert_ne!(id, secret);
    }

    #[test]
    fn test_component_lengths() {
        let id = derive_id_with_salt("app", &scopes(&["a"]), &[0u8; CLIENT_ID_SALT_LEN]);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts[1].len(), DIGEST_LEN * 2);
        assert_eq!(parts[2].len(), DIGEST_LEN * 2);
        assert_eq!(parts[3].len(), CLIENT_ID_SALT_LEN * 2);
    }

    #[test]
    fn test_secret_digest_is_stable() {
        assert_eq!(secret_digest("s3cret"), secret_digest("s3cret"));
        assert_ne!(secret_digest("s3cret"), secret_digest("s3cret!"));
        assert_eq!(secret_digest("s3cret").len(), 64);
    }

    #[test]
    fn test_hex_encoding_is_lowercase() {
        assert_eq!(
            secret_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let id = derive_id_with_salt("app", &scopes(&["a"]), &[0x0a, 0xff, 0, 1, 2, 3, 4, 5]);
        assert!(id.ends_with("_0aff000102030405"));
    }
}
