//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Authentication handlers (register, login, logout, userinfo).
pub mod auth;
/// Health check handler.
pub mod health;
