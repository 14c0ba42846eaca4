//! TOML configuration for the server binary.
//!
//! Loaded once at startup from `drivebox.toml` and immutable afterwards: the
//! signing secret, token TTL and salt length are read-only shared inputs to
//! the authentication pipeline. The secret itself never lives in the file,
//! only the name of the environment variable that holds it.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable not set: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8750
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Auth Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Name of the environment variable holding the signing secret.
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Token validity in seconds. Keep short: logout does not revoke tokens.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    /// Salt length in bytes for newly hashed passwords.
    #[serde(default = "default_salt_len")]
    pub salt_len: usize,
}

fn default_jwt_secret_env() -> String {
    "DRIVEBOX_JWT_SECRET".to_string()
}

fn default_token_ttl_secs() -> i64 {
    3600
}

fn default_salt_len() -> usize {
    16
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_secs: default_token_ttl_secs(),
            salt_len: default_salt_len(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "drivebox.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.salt_len < crate::auth::password::MIN_SALT_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.salt_len must be at least {} bytes",
                crate::auth::password::MIN_SALT_LEN
            )));
        }
        Ok(())
    }

    /// Resolves the signing secret from the configured environment variable.
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        let secret = std::env::var(&self.auth.jwt_secret_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))?;

        if secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "signing secret must be at least 32 characters".to_string(),
            ));
        }

        Ok(secret)
    }
}
