//! Configuration utilities.

/// TOML configuration loading and validation.
pub mod config;
