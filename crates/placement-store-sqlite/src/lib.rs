//! SQLite backend for the placement client's persisted collections.
//!
//! Implements [`placement_core::kv::KeyValueStore`] over a single `kv` table,
//! so the record store and the session survive restarts.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteKv;

#[cfg(test)]
mod tests;
