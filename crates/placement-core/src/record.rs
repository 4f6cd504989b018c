//! Records: the canonical shape of jobs and applications.
//!
//! Upstream producers disagree on field names (`id` vs `_id`, string vs
//! numeric identifiers, `isAccepted` vs `status`). All of that is resolved
//! when a [`Record`] is decoded and [normalised](Record::normalized); nothing
//! past this module checks for aliases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  Error, Result,
  status::{Action, CollectionKind, Status},
};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque identifier of a record, unique within its collection.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Accepts a JSON string or integer; `null` and empty strings are absent.
  fn from_value(value: Value) -> Result<Option<Self>> {
    match value {
      Value::Null => Ok(None),
      Value::String(s) if s.trim().is_empty() => Ok(None),
      Value::String(s) => Ok(Some(Self(s))),
      Value::Number(n) if n.is_i64() || n.is_u64() => {
        Ok(Some(Self(n.to_string())))
      }
      other => Err(Error::InvalidId(other)),
    }
  }
}

impl std::fmt::Display for RecordId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for RecordId {
  fn from(id: &str) -> Self { Self(id.to_owned()) }
}

/// Identifier of the user who performed a state-changing action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Hands back values that are not an identifier so callers can keep them.
  fn from_value(value: Value) -> Result<Self, Value> {
    match value {
      Value::String(s) if !s.is_empty() => Ok(Self(s)),
      Value::Number(n) => Ok(Self(n.to_string())),
      other => Err(other),
    }
  }
}

impl std::fmt::Display for ActorId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ActorId {
  fn from(id: &str) -> Self { Self(id.to_owned()) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A job or application as seen by the sync engine.
///
/// Only the fields the engine acts on are typed; everything else travels in
/// `payload` untouched. An actor field whose value is not an identifier stays
/// in `payload` as-is. On the wire a record is a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Record {
  pub id:          RecordId,
  pub status:      Option<Status>,
  /// Wire name `acceptedBy`.
  pub accepted_by: Option<ActorId>,
  /// Wire name `rejectedBy`.
  pub rejected_by: Option<ActorId>,
  pub payload:     Map<String, Value>,
}

const ID: &str = "id";
const ID_ALIAS: &str = "_id";
const STATUS: &str = "status";
const ACCEPTED_BY: &str = "acceptedBy";
const REJECTED_BY: &str = "rejectedBy";
const IS_ACCEPTED: &str = "isAccepted";

impl Record {
  pub fn new(id: impl Into<RecordId>) -> Self {
    Self {
      id:          id.into(),
      status:      None,
      accepted_by: None,
      rejected_by: None,
      payload:     Map::new(),
    }
  }

  pub fn with_status(mut self, status: &str) -> Self {
    self.status = Some(Status::new(status));
    self
  }

  /// Set a payload field. Reserved keys (`id`, `status`, actor fields) are
  /// routed to their typed counterparts.
  pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.set(key, value.into());
    self
  }

  pub fn set(&mut self, key: &str, value: Value) {
    match key {
      ID | ID_ALIAS => {
        if let Ok(Some(id)) = RecordId::from_value(value) {
          self.id = id;
        }
      }
      STATUS => {
        self.status = value.as_str().map(Status::new);
      }
      ACCEPTED_BY | REJECTED_BY => {
        let actor = match ActorId::from_value(value) {
          Ok(actor) => {
            self.payload.remove(key);
            Some(actor)
          }
          Err(raw) => {
            self.payload.insert(key.to_owned(), raw);
            None
          }
        };
        *self.actor_slot(key) = actor;
      }
      _ => {
        self.payload.insert(key.to_owned(), value);
      }
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> { self.payload.get(key) }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.payload.get(key).and_then(Value::as_str)
  }

  pub fn status(&self) -> Option<&Status> { self.status.as_ref() }

  pub fn actor_for(&self, action: Action) -> Option<&ActorId> {
    match action {
      Action::Accept => self.accepted_by.as_ref(),
      Action::Reject => self.rejected_by.as_ref(),
    }
  }

  fn actor_slot(&mut self, key: &str) -> &mut Option<ActorId> {
    if key == ACCEPTED_BY {
      &mut self.accepted_by
    } else {
      &mut self.rejected_by
    }
  }

  /// Copy of `self` moved into the target state of `action` by `actor`.
  pub fn with_action(&self, action: Action, actor: &ActorId) -> Self {
    let mut next = self.clone();
    next.status = Some(action.target_status());
    let key = match action {
      Action::Accept => ACCEPTED_BY,
      Action::Reject => REJECTED_BY,
    };
    next.payload.remove(key);
    *next.actor_slot(key) = Some(actor.clone());
    next
  }

  /// Overlay `newer` onto `self`: every field present in `newer` wins, every
  /// field absent from it is kept. The identifier never changes.
  pub fn merge_from(&mut self, newer: Record) {
    let Record { id: _, status, accepted_by, rejected_by, payload } = newer;
    if status.is_some() {
      self.status = status;
    }
    self.payload.extend(payload);
    let actors = [(ACCEPTED_BY, accepted_by), (REJECTED_BY, rejected_by)];
    for (key, actor) in actors {
      if actor.is_some() {
        self.payload.remove(key);
        *self.actor_slot(key) = actor;
      } else if self.payload.contains_key(key) {
        *self.actor_slot(key) = None;
      }
    }
  }

  /// Resolve kind-specific spellings into the canonical shape and fill in a
  /// missing status. Used for whole collections.
  pub fn normalized(self, kind: CollectionKind) -> Self {
    let mut record = self.canonicalized(kind);
    if record.status.is_none() {
      record.status = Some(kind.default_status());
    }
    record
  }

  /// Like [`normalized`](Self::normalized) but never invents a status, so a
  /// partial update stays partial.
  pub fn canonicalized(mut self, kind: CollectionKind) -> Self {
    self.status = self.status.take().map(|s| kind.canonical_status(s));

    if kind == CollectionKind::Jobs
      && !kind.is_in_state(self.status.as_ref(), Action::Accept)
    {
      let flagged = self.get(IS_ACCEPTED).and_then(Value::as_bool) == Some(true);
      if flagged || self.accepted_by.is_some() {
        self.status = Some(Action::Accept.target_status());
      }
    }

    self
  }
}

impl TryFrom<Value> for Record {
  type Error = Error;

  fn try_from(value: Value) -> Result<Self> {
    let Value::Object(mut map) = value else {
      return Err(Error::NotAnObject);
    };

    let id = map.remove(ID).map(RecordId::from_value).transpose()?.flatten();
    let alias = map
      .remove(ID_ALIAS)
      .map(RecordId::from_value)
      .transpose()?
      .flatten();

    let id = match (id, alias) {
      (Some(id), Some(alias)) if id != alias => {
        return Err(Error::ConflictingIds { id: id.0, alias: alias.0 });
      }
      (Some(id), _) | (None, Some(id)) => id,
      (None, None) => return Err(Error::MissingId),
    };

    let status = match map.remove(STATUS) {
      None | Some(Value::Null) => None,
      Some(Value::String(s)) => Some(Status::new(s)),
      Some(other) => Some(Status::new(other.to_string())),
    };

    let accepted_by = take_actor(&mut map, ACCEPTED_BY);
    let rejected_by = take_actor(&mut map, REJECTED_BY);

    Ok(Self { id, status, accepted_by, rejected_by, payload: map })
  }
}

/// Remove `key` from `map` if it holds an actor id; otherwise leave it there.
fn take_actor(map: &mut Map<String, Value>, key: &str) -> Option<ActorId> {
  let value = map.remove(key)?;
  match ActorId::from_value(value) {
    Ok(actor) => Some(actor),
    Err(raw) => {
      map.insert(key.to_owned(), raw);
      None
    }
  }
}

impl From<Record> for Value {
  fn from(record: Record) -> Self {
    let Record { id, status, accepted_by, rejected_by, payload } = record;
    let mut map = Map::with_capacity(payload.len() + 4);
    map.insert(ID.to_owned(), Value::String(id.0));
    if let Some(status) = status {
      map.insert(STATUS.to_owned(), Value::String(status.as_str().to_owned()));
    }
    if let Some(actor) = accepted_by {
      map.insert(ACCEPTED_BY.to_owned(), Value::String(actor.0));
    }
    if let Some(actor) = rejected_by {
      map.insert(REJECTED_BY.to_owned(), Value::String(actor.0));
    }
    map.extend(payload);
    Value::Object(map)
  }
}

/// Decode a JSON array of records and normalise each for `kind`.
pub fn decode_collection(kind: CollectionKind, raw: &str) -> Result<Vec<Record>> {
  let records: Vec<Record> = serde_json::from_str(raw)?;
  Ok(normalize_all(kind, records))
}

pub fn normalize_all(kind: CollectionKind, records: Vec<Record>) -> Vec<Record> {
  records.into_iter().map(|r| r.normalized(kind)).collect()
}
