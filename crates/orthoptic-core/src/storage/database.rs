//! SQLite-backed local state.
//!
//! Provides persistent storage for:
//! - The single in-flight exercise-progress record (overwritten on save)
//! - The read-only cache of completed days the calendar renders offline
//! - A key-value store for small application state
//!
//! Each record has one writer at a time; concurrent readers may see a
//! stale row, which callers tolerate.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::{CoreError, StorageError};
use crate::timer::SavedProgress;

use super::data_dir;

const PROGRESS_KEY: &str = "exercise_progress";

/// SQLite database at `~/.config/orthoptic/orthoptic.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the default database, creating file and schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("orthoptic.db");
        Self::open_at(&path)
    }

    /// Open a database at an explicit path (tests and tooling).
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests).
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS completed_days (
                day TEXT PRIMARY KEY
            );",
        )?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(StorageError::from)?;
        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .map_err(StorageError::from)?;
        match rows.next() {
            Some(value) => Ok(Some(value.map_err(StorageError::from)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), CoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(StorageError::from)?;
        Ok(())
    }

    // ── Exercise progress ────────────────────────────────────────────

    /// Overwrite the single in-flight progress record.
    pub fn save_progress(&self, progress: &SavedProgress) -> Result<(), CoreError> {
        let json = serde_json::to_string(progress)?;
        self.kv_set(PROGRESS_KEY, &json)
    }

    /// Load saved progress. A malformed record reads as `None`.
    pub fn load_progress(&self) -> Result<Option<SavedProgress>, CoreError> {
        Ok(self
            .kv_get(PROGRESS_KEY)?
            .and_then(|json| serde_json::from_str(&json).ok()))
    }

    pub fn clear_progress(&self) -> Result<(), CoreError> {
        self.kv_delete(PROGRESS_KEY)
    }

    // ── Completed-days cache ─────────────────────────────────────────

    /// Replace the cached completed-days set with a freshly fetched one.
    pub fn replace_completed_days(&self, days: &BTreeSet<String>) -> Result<(), CoreError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(StorageError::from)?;
        tx.execute("DELETE FROM completed_days", [])
            .map_err(StorageError::from)?;
        for day in days {
            tx.execute(
                "INSERT OR IGNORE INTO completed_days (day) VALUES (?1)",
                params![day],
            )
            .map_err(StorageError::from)?;
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn completed_days(&self) -> Result<BTreeSet<String>, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT day FROM completed_days ORDER BY day")
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StorageError::from)?;
        let mut days = BTreeSet::new();
        for row in rows {
            days.insert(row.map_err(StorageError::from)?);
        }
        Ok(days)
    }
}
