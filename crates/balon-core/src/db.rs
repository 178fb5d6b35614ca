// SQLite persistence layer for preferences and award state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::store::{StateStore, KEY_AWARD_RECORD};

/// SQLite-backed key-value store. Every key is prefixed with the deployment
/// scope, so several leagues can share one database file without seeing each
/// other's state.
pub struct Database {
    conn: Mutex<Connection>,
    scope: String,
}

impl Database {
    /// Open (or create) an unscoped database at `path`. Pass `":memory:"` for
    /// an ephemeral in-memory database (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        Self::open_scoped(path, "")
    }

    /// Open (or create) a database at `path` whose keys live under `scope`.
    pub fn open_scoped(path: &str, scope: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS league_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        if scope.is_empty() {
            info!("state database opened at {}", path);
        } else {
            info!("state database opened at {} (scope '{}')", path, scope);
        }

        Ok(Self {
            conn: Mutex::new(conn),
            scope: scope.to_string(),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn scoped_key(&self, key: &str) -> String {
        if self.scope.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.scope)
        }
    }

    /// Returns `true` if an award record has been persisted in this scope.
    pub fn has_award_record(&self) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM league_state WHERE key = ?1)",
                params![self.scoped_key(KEY_AWARD_RECORD)],
                |row| row.get(0),
            )
            .context("failed to check award record existence")?;
        Ok(exists)
    }
}

impl StateStore for Database {
    /// Uses INSERT OR REPLACE so repeated saves overwrite the previous value.
    fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO league_state (key, value) VALUES (?1, ?2)",
            params![self.scoped_key(key), json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM league_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![self.scoped_key(key)], |row| {
                let json_str: String = row.get(0)?;
                Ok(json_str)
            })
            .context("failed to query league state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn remove_state(&self, key: &str) -> Result<()> {
        debug!("removing state key `{}`", self.scoped_key(key));
        let conn = self.conn();
        conn.execute(
            "DELETE FROM league_state WHERE key = ?1",
            params![self.scoped_key(key)],
        )
        .context("failed to remove state")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
