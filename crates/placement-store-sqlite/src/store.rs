//! [`SqliteKv`]: the SQLite implementation of [`KeyValueStore`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};

use placement_core::kv::{KeyValueStore, StorageError};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Key-value storage in a single SQLite file.
///
/// Calls are short and synchronous; the connection sits behind a mutex so the
/// store can be shared between views.
pub struct SqliteKv {
  conn: Mutex<Connection>,
}

impl SqliteKv {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      if let Err(e) = std::fs::create_dir_all(parent) {
        tracing::warn!(
          dir = %parent.display(),
          error = %e,
          "could not create store directory"
        );
      }
    }
    let store = Self::init(Connection::open(path)?)?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| Error::Poisoned)
  }

  /// Every stored key, in order.
  pub fn keys(&self) -> Result<Vec<String>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
    let keys = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(keys)
  }

  fn read(&self, key: &str) -> Result<Option<String>> {
    let conn = self.conn()?;
    let value = conn
      .query_row(
        "SELECT value FROM kv WHERE key = ?1",
        rusqlite::params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.conn()?;
    conn.execute(
      "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET
         value = excluded.value,
         updated_at = excluded.updated_at",
      rusqlite::params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    let conn = self.conn()?;
    conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
    Ok(())
  }
}

// ─── KeyValueStore impl ──────────────────────────────────────────────────────

impl KeyValueStore for SqliteKv {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.read(key)?)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    Ok(self.write(key, value)?)
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    Ok(self.delete(key)?)
  }
}
