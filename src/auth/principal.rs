//! Principal resolution against the external user store.

use crate::db::UserStore;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Namespace marker prepended to every role label before it is handed to the
/// authorization layer.
pub const AUTHORITY_PREFIX: &str = "ROLE_";

/// The single role a principal holds. No multi-role composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Stable lowercase code used in storage.
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Parses the storage code back into a role.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Upper-cased, namespace-prefixed authority label.
    pub fn authority(&self) -> String {
        format!("{}{}", AUTHORITY_PREFIX, self.code().to_uppercase())
    }
}

/// A known identity as read from the user store. Read-only here; the write
/// path that creates and updates users lives behind [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub nickname: String,
    pub enabled: bool,
    pub role: Role,
    /// Hex digest of the salted password.
    pub password_hash: String,
    /// Hex salt paired with `password_hash`.
    pub salt: String,
}

impl Principal {
    /// Authority labels granted to this principal.
    pub fn authorities(&self) -> Vec<String> {
        vec![self.role.authority()]
    }
}

/// Why a principal could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("username must not be blank")]
    InvalidInput,
    #[error("principal not found")]
    NotFound,
    #[error("user store error: {0}")]
    Store(String),
}

/// Resolves usernames to principals with exactly one store lookup per call.
pub struct PrincipalLoader {
    store: Arc<dyn UserStore>,
}

impl PrincipalLoader {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Loads a principal by username.
    ///
    /// Input is trimmed before lookup; a blank username is rejected before
    /// the store is ever queried. Exactly one lookup per call, no retries.
    pub async fn load_by_username(
        &self,
        username: &str,
    ) -> std::result::Result<Principal, PrincipalError> {
        let username = username.trim();
        if username.is_empty() {
            tracing::warn!("principal lookup rejected: blank username");
            return Err(PrincipalError::InvalidInput);
        }

        let record = self
            .store
            .get_user_by_username(username)
            .await
            .map_err(|e| PrincipalError::Store(e.to_string()))?;

        match record {
            Some(user) => {
                let role = Role::from_code(&user.role).ok_or_else(|| {
                    PrincipalError::Store(format!("unknown role code: {}", user.role))
                })?;
                tracing::debug!(username, "principal resolved");
                Ok(Principal {
                    username: user.username,
                    nickname: user.nickname,
                    enabled: user.enabled,
                    role,
                    password_hash: user.password_hash,
                    salt: user.salt,
                })
            }
            None => {
                tracing::debug!(username, "principal not found");
                Err(PrincipalError::NotFound)
            }
        }
    }
}

/// Convenience used by handlers that only need existence, not errors.
pub async fn try_load(loader: &PrincipalLoader, username: &str) -> Result<Option<Principal>> {
    match loader.load_by_username(username).await {
        Ok(principal) => Ok(Some(principal)),
        Err(PrincipalError::NotFound) | Err(PrincipalError::InvalidInput) => Ok(None),
        Err(PrincipalError::Store(msg)) => Err(crate::types::AppError::Database(msg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::db::{NewUser, UserStore};

    async fn store_with_alice() -> Arc<SqliteStore> {
        let store = SqliteStore::new_memory().await.expect("in-memory store");
        store
            .create_user(&NewUser {
                username: "alice".to_string(),
                nickname: "Alice".to_string(),
                password_hash: "ab".repeat(32),
                salt: "cd".repeat(16),
                enabled: true,
                role: Role::Admin.code().to_string(),
            })
            .await
            .expect("create alice");
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_load_existing_principal() {
        let loader = PrincipalLoader::new(store_with_alice().await);

        let principal = loader.load_by_username("alice").await.expect("should load");

        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::Admin);
        assert!(principal.enabled);
    }

    #[tokio::test]
    async fn test_username_is_trimmed_before_lookup() {
        let loader = PrincipalLoader::new(store_with_alice().await);

        let principal = loader
            .load_by_username("  alice  ")
            .await
            .expect("whitespace must not cause a false negative");

        assert_eq!(principal.username, "alice");
    }

    #[tokio::test]
    async fn test_blank_username_rejected_before_store() {
        let loader = PrincipalLoader::new(store_with_alice().await);

        assert_eq!(
            loader.load_by_username("   ").await,
            Err(PrincipalError::InvalidInput)
        );
        assert_eq!(
            loader.load_by_username("").await,
            Err(PrincipalError::InvalidInput)
        );
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let loader = PrincipalLoader::new(store_with_alice().await);

        assert_eq!(
            loader.load_by_username("mallory").await,
            Err(PrincipalError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let loader = PrincipalLoader::new(store_with_alice().await);

        assert_eq!(
            loader.load_by_username("Alice").await,
            Err(PrincipalError::NotFound)
        );
    }

    #[test]
    fn test_authority_derivation() {
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
        assert_eq!(Role::User.authority(), "ROLE_USER");
        assert_eq!(Role::from_code("admin"), Some(Role::Admin));
        assert_eq!(Role::from_code("superuser"), None);
    }
}
