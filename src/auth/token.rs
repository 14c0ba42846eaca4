//! Token issuance and verification.
//!
//! Tokens are HS256-signed JWTs binding a username (`sub`) to an issue time
//! and a fixed-TTL expiry. Verification is stateless: the signature is
//! recomputed against the server secret and the expiry is checked against an
//! injected [`Clock`], nothing is looked up server-side. There is no
//! revocation list; logout is a client-side token discard, so the TTL should
//! stay short.

use crate::types::{AppError, Claims, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Time source for token issuance and expiry checks.
///
/// Injected so expiry behavior is deterministic under test; production code
/// uses [`SystemClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Why a presented token was rejected.
///
/// Forged (`InvalidSignature`) and merely stale (`Expired`) tokens are kept
/// distinct so operators can count them separately in the logs, even though
/// the middleware collapses both to an anonymous request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is expired")]
    Expired,
}

/// Issues and verifies signed, time-bound bearer tokens.
pub struct TokenCodec {
    secret: String,
    ttl_secs: i64,
    clock: Box<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec with the given signing secret and token TTL.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing JWTs (should be at least 32 chars)
    /// * `ttl_secs` - Token validity in seconds
    pub fn new(secret: String, ttl_secs: i64) -> Self {
        Self::with_clock(secret, ttl_secs, Box::new(SystemClock))
    }

    /// Creates a codec with an explicit time source (used by tests).
    pub fn with_clock(secret: String, ttl_secs: i64, clock: Box<dyn Clock>) -> Self {
        Self {
            secret,
            ttl_secs,
            clock,
        }
    }

    /// Token validity in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issues a token for `username`, expiring `ttl_secs` from now.
    ///
    /// The payload is tamper-evident, not encrypted: the subject is visible
    /// to anyone holding the token.
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = self.clock.now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token and returns the embedded username.
    ///
    /// The signature is checked first; expiry is then checked against the
    /// injected clock rather than by the JWT library, so tests can pin time.
    pub fn verify(&self, token: &str) -> std::result::Result<String, TokenError> {
        // Expiry is validated manually below against self.clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// A clock pinned to a fixed instant.
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    const TEST_SECRET: &str = "test-secret-key-that-is-at-least-32-chars";

    fn instant(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn codec_at(secs: i64, ttl: i64) -> TokenCodec {
        TokenCodec::with_clock(TEST_SECRET.to_string(), ttl, Box::new(FixedClock(instant(secs))))
    }

    #[test]
    fn test_round_trip() {
        let codec = TokenCodec::new(TEST_SECRET.to_string(), 3600);

        let token = codec.issue("alice").expect("should issue");
        let subject = codec.verify(&token).expect("should verify");

        assert_eq!(subject, "alice");
    }

    #[test]
    fn test_expiry_scenario() {
        // Issue at t=0 with TTL=3600.
        let token = codec_at(0, 3600).issue("alice").expect("should issue");

        // Verify at t=10: still valid.
        assert_eq!(codec_at(10, 3600).verify(&token), Ok("alice".to_string()));

        // Verify at t=3601: expired.
        assert_eq!(codec_at(3601, 3600).verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_boundary() {
        let token = codec_at(0, 60).issue("bob").expect("should issue");

        // now == exp counts as expired
        assert_eq!(codec_at(60, 60).verify(&token), Err(TokenError::Expired));
        assert!(codec_at(59, 60).verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issuer = TokenCodec::new("secret-one-that-is-32-chars-long".to_string(), 3600);
        let verifier = TokenCodec::new("secret-two-that-is-32-chars-long".to_string(), 3600);

        let token = issuer.issue("alice").expect("should issue");

        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampering_is_detected() {
        let codec = TokenCodec::new(TEST_SECRET.to_string(), 3600);
        let token = codec.issue("alice").expect("should issue");

        // Flip one character in every position; none may verify.
        let bytes = token.as_bytes().to_vec();
        for i in 0..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[i] = if tampered[i] == b'A' { b'B' } else { b'A' };
            let Ok(tampered) = String::from_utf8(tampered) else {
                continue;
            };
            if tampered == token {
                continue;
            }

            match codec.verify(&tampered) {
                Err(TokenError::InvalidSignature) | Err(TokenError::Malformed) => {}
                other => panic!("tampered token at byte {} verified as {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = TokenCodec::new(TEST_SECRET.to_string(), 3600);

        assert_eq!(codec.verify("not a jwt"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
        assert_eq!(codec.verify("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_blank_subject_is_malformed() {
        let codec = codec_at(0, 3600);
        let token = codec.issue("   ").expect("should issue");

        assert_eq!(codec.verify(&token), Err(TokenError::Malformed));
    }
}
