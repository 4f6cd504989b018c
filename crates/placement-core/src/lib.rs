//! Core types and the local-first sync engine for the placement client.
//!
//! No HTTP or database code lives here. Storage backends implement
//! [`kv::KeyValueStore`]; network transports implement
//! [`gateway::MutationTransport`].

// Transports implement `MutationTransport` with native `async fn`.
#![allow(async_fn_in_trait)]

pub mod binder;
pub mod bus;
pub mod desk;
pub mod error;
pub mod gateway;
pub mod kv;
pub mod notify;
pub mod record;
pub mod report;
pub mod seed;
pub mod status;
pub mod store;
pub mod user;

pub use error::{Error, Result};
