// SQLite persistence for the login session.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::User;

/// Key-value store holding the bearer token and the signed-in user.
pub struct SessionDb {
    conn: Mutex<Connection>,
}

impl SessionDb {
    const TOKEN_KEY: &'static str = "auth_token";
    const USER_KEY: &'static str = "user";

    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS session (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A panic while holding the lock cannot leave a half-applied statement
    /// behind, so a poisoned guard is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist a JSON value under `key`, replacing any previous value.
    pub fn save_value(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize session value")?;
        conn.execute(
            "INSERT OR REPLACE INTO session (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save session value")?;
        Ok(())
    }

    /// Load the value stored under `key`, if any.
    pub fn load_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query session value")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize session value"))
            .transpose()
    }

    pub fn delete_value(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM session WHERE key = ?1", params![key])
            .context("failed to delete session value")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Token / user
    // ------------------------------------------------------------------

    pub fn save_token(&self, token: &str) -> Result<()> {
        self.save_value(Self::TOKEN_KEY, &serde_json::Value::String(token.to_string()))
    }

    pub fn load_token(&self) -> Result<Option<String>> {
        let value = self.load_value(Self::TOKEN_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn save_user(&self, user: &User) -> Result<()> {
        let value = serde_json::to_value(user).context("failed to serialize user")?;
        self.save_value(Self::USER_KEY, &value)
    }

    /// The cached user. A row that no longer matches the `User` shape is
    /// treated as absent.
    pub fn load_user(&self) -> Result<Option<User>> {
        let value = self.load_value(Self::USER_KEY)?;
        Ok(value.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Remove the token and the cached user in one transaction.
    pub fn clear_session(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "DELETE FROM session WHERE key IN (?1, ?2)",
            params![Self::TOKEN_KEY, Self::USER_KEY],
        )
        .context("failed to clear session")?;
        tx.commit().context("failed to commit clear_session")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
