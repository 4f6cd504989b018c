//! Error types for `placement-core`.

use thiserror::Error;

use crate::record::RecordId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record is not a JSON object")]
  NotAnObject,

  #[error("record has no `id` or `_id` field")]
  MissingId,

  #[error("record has conflicting identifiers: id={id:?}, _id={alias:?}")]
  ConflictingIds { id: String, alias: String },

  #[error("unsupported identifier value: {0}")]
  InvalidId(serde_json::Value),

  #[error("record {0} already exists in this collection")]
  DuplicateRecord(RecordId),

  #[error("already applied to job {0}")]
  AlreadyApplied(RecordId),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("storage error: {0}")]
  Storage(#[from] crate::kv::StorageError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
