//! The mutation gateway: remote-first state transitions with an optimistic
//! local fallback.
//!
//! Every call produces a usable [`Record`]. Which path produced it is part of
//! the returned [`MutationOutcome`], never signalled through an error.

use std::future::Future;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
  notify::{Notice, Notifier},
  record::{ActorId, Record, RecordId},
  status::{Action, CollectionKind, Status, TerminalPolicy},
};

// ─── Transport ───────────────────────────────────────────────────────────────

/// A single state-changing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
  pub kind:   CollectionKind,
  pub id:     RecordId,
  pub action: Action,
  pub actor:  ActorId,
}

impl MutationRequest {
  /// `/api/{kind}/{id}/{action}`
  pub fn path(&self) -> String {
    format!("/api/{}/{}/{}", self.kind, self.id, self.action)
  }

  /// `{"acceptedBy": actor}` or `{"rejectedBy": actor}`.
  pub fn body(&self) -> Value {
    let mut body = Map::new();
    body.insert(
      self.action.actor_field().to_owned(),
      Value::String(self.actor.as_str().to_owned()),
    );
    Value::Object(body)
  }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
  #[error("endpoint unreachable: {0}")]
  Unreachable(String),

  #[error("endpoint answered {status}: {message}")]
  Status { status: u16, message: String },

  #[error("response body is not a record: {0}")]
  Decode(String),
}

/// Carries a [`MutationRequest`] to the remote endpoint.
///
/// Implementations make exactly one attempt and return the response body on
/// a success status.
pub trait MutationTransport: Send + Sync {
  fn submit(
    &self,
    request: &MutationRequest,
  ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// A transport with no endpoint behind it; every request fails as
/// unreachable, so every mutation resolves locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl MutationTransport for Offline {
  async fn submit(
    &self,
    request: &MutationRequest,
  ) -> Result<Value, TransportError> {
    Err(TransportError::Unreachable(format!(
      "offline; {} not sent",
      request.path()
    )))
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Why the gateway declined to attempt a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
  /// The action does not apply to this kind (e.g. rejecting a job).
  UnsupportedAction,
  /// The record sits in the opposite terminal state and the policy is
  /// [`TerminalPolicy::Locked`].
  TerminalState(Status),
}

/// The result of [`MutationGateway::mutate`].
#[derive(Debug, Clone)]
pub enum MutationOutcome {
  /// The endpoint accepted the request; the record is its response.
  Remote(Record),
  /// The endpoint could not be used; the record was synthesised locally.
  Local { record: Record, cause: TransportError },
  /// The record was already in the target state; nothing was sent.
  AlreadyInState(Record),
  /// The mutation was not attempted; the record is unchanged.
  Refused { record: Record, reason: Refusal },
}

impl MutationOutcome {
  pub fn record(&self) -> &Record {
    match self {
      Self::Remote(record)
      | Self::Local { record, .. }
      | Self::AlreadyInState(record)
      | Self::Refused { record, .. } => record,
    }
  }

  pub fn into_record(self) -> Record {
    match self {
      Self::Remote(record)
      | Self::Local { record, .. }
      | Self::AlreadyInState(record)
      | Self::Refused { record, .. } => record,
    }
  }

  /// `true` when the result only exists locally.
  pub fn is_degraded(&self) -> bool { matches!(self, Self::Local { .. }) }

  /// `true` when the record moved to a new state, remotely or locally.
  pub fn changed(&self) -> bool {
    matches!(self, Self::Remote(_) | Self::Local { .. })
  }
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Executes accept/reject transitions for one collection kind.
pub struct MutationGateway<T, N> {
  kind:      CollectionKind,
  policy:    TerminalPolicy,
  transport: T,
  notifier:  N,
}

impl<T, N> MutationGateway<T, N>
where
  T: MutationTransport,
  N: Notifier,
{
  pub fn new(kind: CollectionKind, transport: T, notifier: N) -> Self {
    Self { kind, policy: TerminalPolicy::default(), transport, notifier }
  }

  pub fn with_policy(mut self, policy: TerminalPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn kind(&self) -> CollectionKind { self.kind }

  pub fn policy(&self) -> TerminalPolicy { self.policy }

  /// Apply `action` to `entity` on behalf of `actor`.
  ///
  /// At most one request is sent. On any transport failure the returned
  /// record is `entity` moved into the target state with `actor` recorded.
  pub async fn mutate(
    &self,
    entity: &Record,
    action: Action,
    actor: &ActorId,
  ) -> MutationOutcome {
    let noun = self.kind.noun();

    if !self.kind.supports(action) {
      self.notifier.notify(Notice::info(format!(
        "{noun}s cannot be {}",
        action.past_tense()
      )));
      return MutationOutcome::Refused {
        record: entity.clone(),
        reason: Refusal::UnsupportedAction,
      };
    }

    if self.kind.is_in_state(entity.status(), action) {
      self.notifier.notify(Notice::info(format!(
        "{noun} already {}",
        action.past_tense()
      )));
      return MutationOutcome::AlreadyInState(entity.clone());
    }

    if self.policy == TerminalPolicy::Locked
      && self.kind.is_in_state(entity.status(), action.opposite())
    {
      let current = entity
        .status()
        .cloned()
        .unwrap_or_else(|| action.opposite().target_status());
      self.notifier.notify(Notice::info(format!(
        "{noun} is already {current} and cannot be {}",
        action.past_tense()
      )));
      return MutationOutcome::Refused {
        record: entity.clone(),
        reason: Refusal::TerminalState(current),
      };
    }

    let request = MutationRequest {
      kind: self.kind,
      id: entity.id.clone(),
      action,
      actor: actor.clone(),
    };

    let response = self.transport.submit(&request).await;
    match response.and_then(|body| self.decode(&request, body)) {
      Ok(record) => {
        tracing::info!(path = %request.path(), "mutation applied remotely");
        self.notifier.notify(Notice::success(format!(
          "{noun} {}",
          action.past_tense()
        )));
        MutationOutcome::Remote(record)
      }
      Err(cause) => {
        tracing::warn!(
          path = %request.path(),
          error = %cause,
          "mutation endpoint failed; applying locally"
        );
        self.notifier.notify(Notice::success(format!(
          "{noun} {} (local)",
          action.past_tense()
        )));
        MutationOutcome::Local { record: entity.with_action(action, actor), cause }
      }
    }
  }

  /// The response must describe the record that was asked for.
  fn decode(
    &self,
    request: &MutationRequest,
    body: Value,
  ) -> Result<Record, TransportError> {
    let record = Record::try_from(body)
      .map_err(|e| TransportError::Decode(e.to_string()))?;
    if record.id != request.id {
      return Err(TransportError::Decode(format!(
        "response is for {} but {} was requested",
        record.id, request.id
      )));
    }
    Ok(record.canonicalized(self.kind))
  }
}
