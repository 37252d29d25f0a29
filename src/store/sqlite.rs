//! SQLite-backed [`KeyValueStore`].
//!
//! One table, one row per `(channel, key)`.  Writes are upserts so the
//! registry's full-rewrite semantics map directly onto a single statement.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{channel_key, KeyValueStore};
use crate::error::{Error, Result};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// and the `channel_values` table as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS channel_values (
                channel TEXT NOT NULL,
                key     TEXT NOT NULL,
                value   TEXT NOT NULL,
                PRIMARY KEY (channel, key)
            )",
            [],
        )?;

        log::info!("[STORE] Opened SQLite store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get_channel_value(&self, channel: &str, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM channel_values WHERE channel = ?1 AND key = ?2",
                params![channel_key(channel), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_channel_value(&self, channel: &str, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO channel_values (channel, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(channel, key) DO UPDATE SET value = excluded.value",
            params![channel_key(channel), key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("monitor.db");
        SqliteStore::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn upsert_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("m.db")).unwrap();

        store.set_channel_value("#rust", "k", "1").unwrap();
        store.set_channel_value("#rust", "k", "2").unwrap();

        assert_eq!(store.get_channel_value("#rust", "k").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get_channel_value("#rust", "other").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_channel_value("#Rust", "stackexchange-posted-42", "1700000000").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get_channel_value("#rust", "stackexchange-posted-42").unwrap().as_deref(),
            Some("1700000000")
        );
    }
}
