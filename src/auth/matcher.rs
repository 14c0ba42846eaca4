//! Credential matching for form-login paths.

use crate::auth::password::PasswordHasher;
use crate::auth::principal::Principal;

/// Matches a presented plaintext credential against a principal's stored
/// `(salt, digest)` pair.
///
/// This is a pure verifier: it never computes a digest for storage. Hashing a
/// new password belongs to the principal write path (registration/update),
/// not here.
pub struct CredentialMatcher {
    hasher: PasswordHasher,
    // Well-formed pair that matches no real password; verified against when
    // the principal is absent so both outcomes do comparable work.
    dummy_digest: String,
    dummy_salt: String,
}

impl CredentialMatcher {
    pub fn new(hasher: PasswordHasher) -> Self {
        let dummy_salt = hasher.generate_salt();
        let dummy_digest = hasher
            .hash("\0drivebox-dummy-credential\0", &dummy_salt)
            .unwrap_or_default();
        Self {
            hasher,
            dummy_digest,
            dummy_salt,
        }
    }

    /// Returns whether `presented` matches the principal's stored credential.
    ///
    /// An absent principal yields `false` through the same code path as a
    /// wrong password, so callers (and their error shapes) cannot tell the
    /// two apart. Never errors.
    pub fn matches(&self, presented: &str, principal: Option<&Principal>) -> bool {
        match principal {
            Some(p) => self.hasher.verify(presented, &p.password_hash, &p.salt),
            None => {
                // Burn an equivalent hash computation; the result is always
                // false because no real password maps to the dummy digest.
                self.hasher
                    .verify(presented, &self.dummy_digest, &self.dummy_salt);
                false
            }
        }
    }
}
