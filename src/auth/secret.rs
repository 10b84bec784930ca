//! The two ways a presented secret is turned into something storable.
//!
//! Anonymous credentials are device fingerprints with no username to index
//! by, so their stored key is a deterministic salted SHA-512 digest and the
//! digest doubles as the lookup key. Named credentials carry a human
//! password: the row is found by username and the password is only ever
//! compared against a salted Argon2id hash.

use std::fmt;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha512};

use crate::{Error, Result};

pub const DEFAULT_ANONYMOUS_SALT: &str = "nx7sn3ks67La72&2";

/// A presented secret, tagged by credential kind.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    Named { username: String, password: String },
    Anonymous { device: String },
}

impl Secret {
    pub fn new(secret: impl Into<String>, username: Option<String>) -> Self {
        match username {
            Some(username) => Secret::Named {
                username,
                password: secret.into(),
            },
            None => Secret::Anonymous {
                device: secret.into(),
            },
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Secret::Named { username, .. } => Some(username),
            Secret::Anonymous { .. } => None,
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Named { username, .. } => f
                .debug_struct("Named")
                .field("username", username)
                .finish_non_exhaustive(),
            Secret::Anonymous { .. } => f.debug_struct("Anonymous").finish_non_exhaustive(),
        }
    }
}

#[derive(Clone)]
pub struct SecretScheme {
    anonymous_salt: String,
}

impl SecretScheme {
    pub fn new(anonymous_salt: impl Into<String>) -> Self {
        Self {
            anonymous_salt: anonymous_salt.into(),
        }
    }

    /// Lookup key for an anonymous credential. Same input, same key.
    pub fn device_key(&self, device: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(self.anonymous_salt.as_bytes());
        hasher.update(device.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Argon2id PHC string with a fresh salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| Error::Internal(anyhow::anyhow!("salt encoding: {e}")))?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(anyhow::anyhow!("password hashing: {e}")))?;
        Ok(hash.to_string())
    }

    /// Any failure to parse or compare counts as a mismatch.
    pub fn verify_password(&self, stored: &str, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// The value stored in the credential's key column.
    pub fn stored_key(&self, secret: &Secret) -> Result<String> {
        match secret {
            Secret::Named { password, .. } => self.hash_password(password),
            Secret::Anonymous { device } => Ok(self.device_key(device)),
        }
    }
}

impl Default for SecretScheme {
    fn default() -> Self {
        Self::new(DEFAULT_ANONYMOUS_SALT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_key_is_deterministic_and_salted() {
        let scheme = SecretScheme::default();
        let key = scheme.device_key("device-1");
        assert_eq!(key, scheme.device_key("device-1"));
        assert_eq!(key.len(), 128);
        assert_ne!(key, scheme.device_key("device-2"));
        assert_ne!(key, SecretScheme::new("other salt").device_key("device-1"));
    }

    #[test]
    fn password_hash_verifies_only_the_right_password() {
        let scheme = SecretScheme::default();
        let stored = scheme.hash_password("pw").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(scheme.verify_password(&stored, "pw"));
        assert!(!scheme.verify_password(&stored, "wrong"));
        assert!(!scheme.verify_password("not a phc string", "pw"));
    }

    #[test]
    fn password_hashes_are_salted() {
        let scheme = SecretScheme::default();
        assert_ne!(scheme.hash_password("pw").unwrap(), scheme.hash_password("pw").unwrap());
    }

    #[test]
    fn debug_hides_secrets() {
        let named = Secret::new("hunter2", Some("al".to_owned()));
        let shown = format!("{named:?}");
        assert!(shown.contains("al"));
        assert!(!shown.contains("hunter2"));

        let anon = Secret::new("fingerprint", None);
        assert!(!format!("{anon:?}").contains("fingerprint"));
        assert_eq!(anon.username(), None);
    }
}
