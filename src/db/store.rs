//! libsql-backed user store.

use crate::types::{AppError, Result};
use chrono::Utc;
use libsql::{Builder, Connection, Database};
use uuid::Uuid;

/// A user row as persisted. The authentication core reads these through
/// [`UserStore`]; it never mutates them outside the explicit write path.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub nickname: String,
    pub password_hash: String,
    pub salt: String,
    pub enabled: bool,
    pub role: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields required to create a user. The `(password_hash, salt)` pair comes
/// from the password hasher on the write path.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub nickname: String,
    pub password_hash: String,
    pub salt: String,
    pub enabled: bool,
    pub role: String,
}

/// Query contract the authentication core consumes from the user store.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by exact (case-sensitive) username.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Creates a user. Fails with [`AppError::Conflict`] on duplicate username.
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord>;

    /// Flips a user's enabled flag.
    async fn set_enabled(&self, username: &str, enabled: bool) -> Result<()>;
}

/// SQLite-backed store (local file or in-memory) via libsql.
pub struct SqliteStore {
    _db: Database,
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a local database file.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        // A single connection is opened up front and shared: for `:memory:`
        // databases each new connection is a distinct empty database, so the
        // schema must live on the same connection every query uses.
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { _db: db, conn };
        store.initialize_schema().await?;

        Ok(store)
    }

    /// Opens an in-memory database (ephemeral, used by tests).
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    fn connection(&self) -> Result<Connection> {
        Ok(self.conn.clone())
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                nickname TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                role TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        Ok(())
    }

    fn row_to_user(row: &libsql::Row) -> Result<UserRecord> {
        let enabled: i64 = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;
        Ok(UserRecord {
            id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            username: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
            nickname: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            password_hash: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
            salt: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
            enabled: enabled != 0,
            role: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
            created_at: row.get(7).map_err(|e| AppError::Database(e.to_string()))?,
            updated_at: row.get(8).map_err(|e| AppError::Database(e.to_string()))?,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteStore {
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, username, nickname, password_hash, salt, enabled, role,
                        created_at, updated_at
                 FROM users WHERE username = ?",
                [username],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Ok(Some(Self::row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn create_user(&self, user: &NewUser) -> Result<UserRecord> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO users (id, username, nickname, password_hash, salt, enabled, role,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.as_str(),
                user.username.as_str(),
                user.nickname.as_str(),
                user.password_hash.as_str(),
                user.salt.as_str(),
                user.enabled as i64,
                user.role.as_str(),
                now,
                now,
            ),
        )
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") {
                AppError::Conflict(format!("username already exists: {}", user.username))
            } else {
                AppError::Database(format!("Failed to create user: {}", msg))
            }
        })?;

        Ok(UserRecord {
            id,
            username: user.username.clone(),
            nickname: user.nickname.clone(),
            password_hash: user.password_hash.clone(),
            salt: user.salt.clone(),
            enabled: user.enabled,
            role: user.role.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn set_enabled(&self, username: &str, enabled: bool) -> Result<()> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let affected = conn
            .execute(
                "UPDATE users SET enabled = ?, updated_at = ? WHERE username = ?",
                (enabled as i64, now, username),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?;

        if affected == 0 {
            return Err(AppError::NotFound(format!("no such user: {}", username)));
        }

        Ok(())
    }
}
