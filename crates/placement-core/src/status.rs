//! Collection kinds, lifecycle statuses, and the actions that move records
//! between them.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::bus::Topic;

// ─── Collection kind ─────────────────────────────────────────────────────────

/// The two record collections the engine synchronises.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollectionKind {
  Applications,
  Jobs,
}

impl CollectionKind {
  /// Key under which the whole collection is persisted.
  pub fn storage_key(self) -> &'static str {
    match self {
      Self::Applications => "placement_applications_v1",
      Self::Jobs => "placement_jobs_v1",
    }
  }

  /// Broadcast topic carrying full-collection updates.
  pub fn topic(self) -> Topic {
    match self {
      Self::Applications => Topic::new("applications:updated"),
      Self::Jobs => Topic::new("jobs:updated"),
    }
  }

  /// Singular noun used in user-facing notices.
  pub fn noun(self) -> &'static str {
    match self {
      Self::Applications => "Application",
      Self::Jobs => "Job",
    }
  }

  /// Status assigned to a record that arrives without one.
  pub fn default_status(self) -> Status {
    match self {
      Self::Applications => Status::new(Status::PENDING),
      Self::Jobs => Status::new(Status::ACTIVE),
    }
  }

  pub fn supports(self, action: Action) -> bool {
    match self {
      Self::Applications => true,
      Self::Jobs => action == Action::Accept,
    }
  }

  /// Fold kind-specific spellings into the canonical status.
  pub fn canonical_status(self, status: Status) -> Status {
    match self {
      Self::Applications if status.is(Status::HIRED) => {
        Status::new(Status::ACCEPTED)
      }
      _ => status,
    }
  }

  /// Whether `status` already satisfies the target state of `action`.
  pub fn is_in_state(self, status: Option<&Status>, action: Action) -> bool {
    let Some(status) = status else { return false };
    match (self, action) {
      (Self::Applications, Action::Accept) => {
        status.is(Status::ACCEPTED) || status.is(Status::HIRED)
      }
      (Self::Applications, Action::Reject) => status.is(Status::REJECTED),
      (Self::Jobs, Action::Accept) => {
        status.is(Status::ACCEPTED) || status.is(Status::TAKEN)
      }
      (Self::Jobs, Action::Reject) => status.is(Status::REJECTED),
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// A lifecycle status string, stored trimmed and lower-cased.
///
/// Job statuses are open-ended, so this is a string newtype rather than an
/// enum; the well-known values are associated constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
  pub const ACCEPTED: &'static str = "accepted";
  pub const ACTIVE: &'static str = "active";
  pub const HIRED: &'static str = "hired";
  pub const PENDING: &'static str = "pending";
  pub const REJECTED: &'static str = "rejected";
  pub const REVIEWED: &'static str = "reviewed";
  pub const TAKEN: &'static str = "taken";

  pub fn new(raw: impl AsRef<str>) -> Self {
    Self(raw.as_ref().trim().to_lowercase())
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is(&self, other: &str) -> bool { self.0 == other }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// A state-changing action performed through the mutation gateway.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
  Accept,
  Reject,
}

impl Action {
  /// The status a record ends up in after this action.
  pub fn target_status(self) -> Status {
    Status::new(self.past_tense())
  }

  pub fn past_tense(self) -> &'static str {
    match self {
      Self::Accept => Status::ACCEPTED,
      Self::Reject => Status::REJECTED,
    }
  }

  /// Wire name of the field recording who performed the action.
  pub fn actor_field(self) -> &'static str {
    match self {
      Self::Accept => "acceptedBy",
      Self::Reject => "rejectedBy",
    }
  }

  pub fn opposite(self) -> Self {
    match self {
      Self::Accept => Self::Reject,
      Self::Reject => Self::Accept,
    }
  }
}

// ─── Terminal policy ─────────────────────────────────────────────────────────

/// Whether a record in one terminal state may be moved to the other.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TerminalPolicy {
  /// `accepted` and `rejected` are final.
  #[default]
  Locked,
  /// An accepted record may later be rejected, and vice versa.
  Reversible,
}
