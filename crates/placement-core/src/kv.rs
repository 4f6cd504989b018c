//! The synchronous key-value abstraction underneath the record store, plus an
//! in-process implementation.
//!
//! Backends live in their own crates (e.g. `placement-store-sqlite`); higher
//! layers only see [`KeyValueStore`].

use std::{
  collections::HashMap,
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage unavailable: {0}")]
  Unavailable(String),

  #[error("storage backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// String-keyed persistent storage with whole-value reads and writes.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

  /// Overwrite the value stored under `key`.
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ─── MemoryKv ────────────────────────────────────────────────────────────────

/// A [`KeyValueStore`] held in process memory.
///
/// [`MemoryKv::set_failing`] makes every operation return
/// [`StorageError::Unavailable`], which is how tests exercise the degraded
/// paths of the record store.
#[derive(Debug, Default)]
pub struct MemoryKv {
  entries: Mutex<HashMap<String, String>>,
  failing: AtomicBool,
}

impl MemoryKv {
  pub fn new() -> Self { Self::default() }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  fn check(&self) -> Result<(), StorageError> {
    if self.failing.load(Ordering::SeqCst) {
      Err(StorageError::Unavailable("memory store is switched off".into()))
    } else {
      Ok(())
    }
  }
}

impl KeyValueStore for MemoryKv {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    self.check()?;
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.check()?;
    let mut entries =
      self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.check()?;
    let mut entries =
      self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.remove(key);
    Ok(())
  }
}
