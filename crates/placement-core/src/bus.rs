//! Cross-view notification bus.
//!
//! A process-wide publish/subscribe channel keyed by [`Topic`]. Publishing is
//! a synchronous fan-out to the handlers subscribed at that moment; nothing is
//! buffered or replayed. The bus is an explicit value passed to whoever needs
//! it, never a global.

use std::{
  borrow::Cow,
  panic::{AssertUnwindSafe, catch_unwind},
  sync::{
    Arc, Mutex, PoisonError, Weak,
    atomic::{AtomicU64, Ordering},
  },
};

use crate::record::Record;

// ─── Topic ───────────────────────────────────────────────────────────────────

/// A fixed broadcast channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(Cow<'static, str>);

impl Topic {
  pub const fn new(name: &'static str) -> Self { Self(Cow::Borrowed(name)) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for Topic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Bus ─────────────────────────────────────────────────────────────────────

type Handler = Arc<dyn Fn(&[Record]) + Send + Sync>;

struct Entry {
  id:      u64,
  topic:   Topic,
  handler: Handler,
}

#[derive(Default)]
struct Inner {
  next_id: AtomicU64,
  entries: Mutex<Vec<Entry>>,
}

impl Inner {
  fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_registered(&self, id: u64) -> bool {
    self.entries().iter().any(|e| e.id == id)
  }
}

/// Handle to a shared subscriber list. Cloning is cheap and every clone
/// addresses the same subscribers.
#[derive(Clone, Default)]
pub struct NotificationBus {
  inner: Arc<Inner>,
}

impl NotificationBus {
  pub fn new() -> Self { Self::default() }

  /// Register `handler` for `topic`. The handler stays registered until the
  /// returned [`Subscription`] is dropped.
  pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
  where
    F: Fn(&[Record]) + Send + Sync + 'static,
  {
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    self.inner.entries().push(Entry {
      id,
      topic: topic.clone(),
      handler: Arc::new(handler),
    });
    tracing::debug!(%topic, subscription = id, "bus subscribe");
    Subscription { bus: Arc::downgrade(&self.inner), id }
  }

  /// Deliver `records` to every current subscriber of `topic`, in
  /// subscription order. Returns the number of handlers that completed.
  ///
  /// The subscriber list is not locked while handlers run, so a handler may
  /// itself subscribe, unsubscribe, or publish. A handler that panics is
  /// logged and skipped; delivery continues with the next one.
  pub fn publish(&self, topic: &Topic, records: &[Record]) -> usize {
    let targets: Vec<(u64, Handler)> = self
      .inner
      .entries()
      .iter()
      .filter(|e| &e.topic == topic)
      .map(|e| (e.id, Arc::clone(&e.handler)))
      .collect();

    let mut delivered = 0;
    for (id, handler) in targets {
      // Dropped by an earlier handler in this same dispatch.
      if !self.inner.is_registered(id) {
        continue;
      }
      match catch_unwind(AssertUnwindSafe(|| handler(records))) {
        Ok(()) => delivered += 1,
        Err(_) => {
          tracing::error!(%topic, subscription = id, "bus handler panicked");
        }
      }
    }

    tracing::debug!(%topic, records = records.len(), delivered, "bus publish");
    delivered
  }

  pub fn subscriber_count(&self, topic: &Topic) -> usize {
    self.inner.entries().iter().filter(|e| &e.topic == topic).count()
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// Registration guard returned by [`NotificationBus::subscribe`]; dropping it
/// deregisters the handler.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
  bus: Weak<Inner>,
  id:  u64,
}

impl Subscription {
  pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(inner) = self.bus.upgrade() {
      inner.entries().retain(|e| e.id != self.id);
      tracing::debug!(subscription = self.id, "bus unsubscribe");
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("id", &self.id).finish()
  }
}
