//! Salted password hashing and constant-time verification.
//!
//! Drivebox stores passwords as a `(salt, digest)` pair: a per-user random
//! salt and the SHA-256 digest of `salt_bytes || password`, both hex-encoded.
//! Verification recomputes the digest and compares in constant time, so a
//! wrong password and a malformed stored credential are indistinguishable to
//! the caller (both are simply `false`).

use crate::types::{AppError, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Smallest salt length (in bytes) accepted during verification.
pub const MIN_SALT_LEN: usize = 8;

/// Default salt length (in bytes) for newly generated salts.
pub const DEFAULT_SALT_LEN: usize = 16;

/// SHA-256 digest length in bytes.
const DIGEST_LEN: usize = 32;

/// Salted one-way password hasher.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    salt_len: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_SALT_LEN)
    }
}

impl PasswordHasher {
    /// Creates a hasher that generates salts of `salt_len` bytes.
    ///
    /// Lengths below [`MIN_SALT_LEN`] are clamped up, so a misconfigured
    /// deployment can never weaken newly created credentials.
    pub fn new(salt_len: usize) -> Self {
        Self {
            salt_len: salt_len.max(MIN_SALT_LEN),
        }
    }

    /// Generates a fresh random salt, hex-encoded.
    ///
    /// Each call draws new bytes from the thread-local CSPRNG; salts are
    /// never reused across principals.
    pub fn generate_salt(&self) -> String {
        let mut bytes = vec![0u8; self.salt_len];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Computes the hex digest of `plaintext` under `salt`.
    ///
    /// Deterministic: the same `(plaintext, salt)` pair always yields the
    /// same digest. Fails only when the salt itself is unusable, which is a
    /// write-path programming error rather than a bad credential.
    pub fn hash(&self, plaintext: &str, salt: &str) -> Result<String> {
        let salt_bytes = hex::decode(salt)
            .map_err(|_| AppError::Auth("salt is not valid hex".to_string()))?;
        if salt_bytes.len() < MIN_SALT_LEN {
            return Err(AppError::Auth(format!(
                "salt must be at least {} bytes",
                MIN_SALT_LEN
            )));
        }

        Ok(hex::encode(digest_bytes(plaintext, &salt_bytes)))
    }

    /// Verifies `plaintext` against a stored `(digest, salt)` pair.
    ///
    /// Returns `false` for any malformed input (bad hex, short salt, wrong
    /// digest length) instead of erroring, so the failure shape never leaks
    /// which part was wrong. The digest comparison is constant-time.
    pub fn verify(&self, plaintext: &str, digest: &str, salt: &str) -> bool {
        let Ok(salt_bytes) = hex::decode(salt) else {
            return false;
        };
        if salt_bytes.len() < MIN_SALT_LEN {
            return false;
        }
        let Ok(digest_stored) = hex::decode(digest) else {
            return false;
        };
        if digest_stored.len() != DIGEST_LEN {
            return false;
        }

        let computed = digest_bytes(plaintext, &salt_bytes);
        computed.as_slice().ct_eq(digest_stored.as_slice()).into()
    }
}

fn digest_bytes(plaintext: &str, salt_bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(salt_bytes);
    hasher.update(plaintext.as_bytes());
    hasher.finalize().into()
}
