//! Request authentication pipeline.
//!
//! Everything needed to establish, per request, whether the caller is a
//! known, enabled principal and which authorities it holds:
//!
//! - [`password`] - salted one-way hashing with constant-time verification
//! - [`token`] - stateless HS256 bearer tokens with a fixed TTL
//! - [`principal`] - username-to-principal resolution and authority derivation
//! - [`matcher`] - plaintext-vs-stored-credential matching for form login
//! - [`middleware`] - the per-request authentication pass and extractors
//! - [`handlers`] - terminal handlers (denial payload, logout audit)
//!
//! # Security Properties
//!
//! - Tokens are tamper-evident (keyed MAC), not encrypted; only the server
//!   secret can mint a token that verifies.
//! - Authentication is fail-open to *anonymous*, never to an identity: any
//!   failure along the pipeline leaves the request without an identity
//!   context, and authorization downstream produces the client-visible error.
//! - Unknown user and wrong password are indistinguishable to callers.
//!
//! # Known Limitation
//!
//! Verification is stateless, so logout and account-disable do not revoke
//! tokens issued earlier; they stay valid until their TTL expires. Keep the
//! TTL short. Fixing this properly needs a revocation-list redesign.

/// Terminal handlers for denial and logout.
pub mod handlers;
/// Credential matching for form-login paths.
pub mod matcher;
/// Per-request authentication middleware and identity extractors.
pub mod middleware;
/// Salted password hashing and constant-time verification.
pub mod password;
/// Principal resolution and authority derivation.
pub mod principal;
/// Stateless token issuance and verification.
pub mod token;
