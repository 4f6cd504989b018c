//! Error type for `placement-store-sqlite`.

use placement_core::kv::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// The connection mutex was poisoned by a panic on another thread.
  #[error("database connection is unusable")]
  Poisoned,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for StorageError {
  fn from(err: Error) -> Self {
    match err {
      Error::Poisoned => StorageError::Unavailable(err.to_string()),
      other => StorageError::Backend(Box::new(other)),
    }
  }
}
