//! Users, roles, credential lookup, and the persisted session.
//!
//! Role checks here are UI-level gates only; nothing downstream enforces
//! them.

use std::{str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, kv::KeyValueStore, record::ActorId};

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
  Student,
  Employer,
  /// Placement officer; the only role that reviews jobs and applications.
  Officer,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Student => "student",
      Self::Employer => "employer",
      Self::Officer => "officer",
      Self::Admin => "admin",
    }
  }
}

impl FromStr for Role {
  type Err = Error;

  /// Case- and whitespace-insensitive; accepts the spellings of "placement
  /// officer" seen in stored sessions.
  fn from_str(raw: &str) -> Result<Self, Error> {
    match raw.trim().to_lowercase().as_str() {
      "student" => Ok(Self::Student),
      "employer" => Ok(Self::Employer),
      "officer" | "placement officer" | "placement-officer"
      | "placement_officer" => Ok(Self::Officer),
      "admin" => Ok(Self::Admin),
      _ => Err(Error::UnknownRole(raw.to_owned())),
    }
  }
}

impl TryFrom<String> for Role {
  type Error = Error;

  fn try_from(raw: String) -> Result<Self, Error> { raw.parse() }
}

impl From<Role> for String {
  fn from(role: Role) -> Self { role.as_str().to_owned() }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  #[serde(default)]
  pub id:       String,
  pub username: String,
  /// Never written into the persisted session.
  #[serde(default, skip_serializing)]
  pub password: String,
  pub role:     Role,
  pub name:     String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company:  Option<String>,
}

impl User {
  /// The id recorded on mutations; falls back to the username when the user
  /// has no id.
  pub fn actor_id(&self) -> ActorId {
    if self.id.is_empty() {
      ActorId::new(self.username.clone())
    } else {
      ActorId::new(self.id.clone())
    }
  }

  pub fn can_review(&self) -> bool { self.role == Role::Officer }

  pub fn can_apply(&self) -> bool { self.role == Role::Student }

  pub fn can_post_jobs(&self) -> bool { self.role == Role::Employer }

  pub fn can_view_reports(&self) -> bool {
    matches!(self.role, Role::Officer | Role::Admin)
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Credential lookup over a fixed set of users.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  users: Vec<User>,
}

impl Directory {
  pub fn new(users: Vec<User>) -> Self { Self { users } }

  pub fn authenticate(&self, username: &str, password: &str) -> Option<&User> {
    self
      .users
      .iter()
      .find(|u| u.username == username && u.password == password)
  }

  pub fn users(&self) -> &[User] { &self.users }
}

// ─── Session ─────────────────────────────────────────────────────────────────

const SESSION_KEY: &str = "placementUser";

/// The logged-in user, persisted across runs.
///
/// Storage problems never surface: an unreadable session reads as logged
/// out, and a failed write leaves the login valid for this process only.
pub struct Session {
  kv: Arc<dyn KeyValueStore>,
}

impl Session {
  pub fn new(kv: Arc<dyn KeyValueStore>) -> Self { Self { kv } }

  /// Check credentials against `directory` and persist the user on success.
  pub fn login(
    &self,
    directory: &Directory,
    username: &str,
    password: &str,
  ) -> Option<User> {
    let user = directory.authenticate(username, password)?.clone();
    let stored = serde_json::to_string(&user)
      .map_err(Error::from)
      .and_then(|raw| self.kv.set(SESSION_KEY, &raw).map_err(Error::from));
    if let Err(e) = stored {
      tracing::warn!(error = %e, "could not persist session");
    }
    tracing::info!(user = %user.username, role = %user.role, "logged in");
    Some(user)
  }

  pub fn current(&self) -> Option<User> {
    let raw = match self.kv.get(SESSION_KEY) {
      Ok(raw) => raw?,
      Err(e) => {
        tracing::warn!(error = %e, "could not read session");
        return None;
      }
    };
    match serde_json::from_str(&raw) {
      Ok(user) => Some(user),
      Err(e) => {
        tracing::warn!(error = %e, "stored session is unreadable");
        None
      }
    }
  }

  pub fn logout(&self) {
    if let Err(e) = self.kv.remove(SESSION_KEY) {
      tracing::warn!(error = %e, "could not clear session");
    }
  }
}
