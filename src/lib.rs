//! # Drivebox - multi-user file-storage platform, authentication core
//!
//! This crate is the request authentication pipeline of the Drivebox
//! platform: token issuance and verification, per-request identity
//! resolution, salted-password verification behind a pluggable credential
//! matcher, and the terminal handlers for denial and logout. Surrounding
//! CRUD for users and storage sources lives behind the [`db::UserStore`]
//! boundary and is not part of this crate.
//!
//! ## Overview
//!
//! Drivebox can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `drivebox-server` binary
//! 2. **As a library** - Import the authentication components into your own
//!    Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use drivebox::auth::token::TokenCodec;
//!
//! let codec = TokenCodec::new(secret, 3600);
//! let token = codec.issue("alice")?;
//! assert_eq!(codec.verify(&token)?, "alice");
//! ```
//!
//! ## Request Flow
//!
//! Inbound request -> authentication middleware extracts the bearer token ->
//! [`auth::token::TokenCodec`] verifies it -> [`auth::principal::PrincipalLoader`]
//! resolves the principal -> an [`auth::middleware::Identity`] is bound to the
//! request -> handler extractors enforce authorization -> terminal handlers
//! produce the denial payload or the logout audit line.
//!
//! Any failure along the way leaves the request anonymous; no authentication
//! error ever surfaces to the client directly.
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - the authentication pipeline
//! - [`db`] - user store boundary (libsql)
//! - [`types`] - common types and error handling
//! - [`utils`] - configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Request authentication pipeline.
pub mod auth;
/// User store boundary (libsql).
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::matcher::CredentialMatcher;
pub use auth::password::PasswordHasher;
pub use auth::principal::{Principal, PrincipalLoader, Role};
pub use auth::token::{Clock, SystemClock, TokenCodec, TokenError};
pub use db::{SqliteStore, UserStore};
pub use types::{AppError, Result};
pub use utils::config::AppConfig;

use std::sync::Arc;

/// Application state shared across handlers.
///
/// Everything here is read-only after startup; per-request identity lives in
/// request extensions, never in this struct.
#[derive(Clone)]
pub struct AppState {
    /// Immutable server configuration.
    pub config: Arc<AppConfig>,
    /// User store boundary.
    pub store: Arc<dyn UserStore>,
    /// Password hasher (write path: registration).
    pub hasher: Arc<PasswordHasher>,
    /// Token issuance and verification.
    pub codec: Arc<TokenCodec>,
    /// Username-to-principal resolution.
    pub loader: Arc<PrincipalLoader>,
    /// Plaintext-vs-stored credential matching (login path).
    pub matcher: Arc<CredentialMatcher>,
}

impl AppState {
    /// Wires the authentication components around a user store.
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>, jwt_secret: String) -> Self {
        let hasher = PasswordHasher::new(config.auth.salt_len);
        let codec = TokenCodec::new(jwt_secret, config.auth.token_ttl_secs);
        let loader = PrincipalLoader::new(store.clone());
        let matcher = CredentialMatcher::new(hasher.clone());

        Self {
            config: Arc::new(config),
            store,
            hasher: Arc::new(hasher),
            codec: Arc::new(codec),
            loader: Arc::new(loader),
            matcher: Arc::new(matcher),
        }
    }
}
