//! HTTP API handlers and routes.
//!
//! The REST surface of the Drivebox authentication core, built on axum.
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/auth`)
//! - `POST /api/auth/register` - Register a new user
//! - `POST /api/auth/login` - Login and receive a bearer token
//! - `POST /api/auth/logout` - Record logout (client discards its token)
//! - `GET /api/auth/userinfo` - Current caller's profile (authenticated)
//!
//! ## Administration (`/api/admin`)
//! - `GET /api/admin/check` - Requires the admin authority
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Liveness probe
//!
//! # Authentication
//!
//! Protected endpoints expect a bearer token in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//! Requests without a valid token still reach the handlers; per-handler
//! extractors reject them with 401 (unauthenticated) or 403 (insufficient
//! privileges).

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
