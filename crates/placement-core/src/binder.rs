//! [`ViewBinder`]: a view's working copy of one collection.
//!
//! A binder is seeded once, then kept current by merging single-record
//! updates (from the mutation gateway) and by wholesale replacement when a
//! store broadcast arrives. Store-backed binders write their entire working
//! copy back after every local change so every other mounted view converges.
//!
//! Dropping a binder is unmounting it: its bus subscription is released and
//! any [`BinderHandle`] still held by an in-flight task turns into a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::{
  Error, Result,
  bus::Subscription,
  record::{Record, RecordId},
  status::CollectionKind,
  store::RecordStore,
};

/// Load state of a view's working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
  /// Not seeded yet.
  Loading,
  Ready,
  /// The initial fetch failed; the working copy is empty.
  LoadFailed(String),
}

struct Working {
  records:  Vec<Record>,
  state:    ViewState,
  /// Bumped on every change; a view re-renders when it moves.
  revision: u64,
}

struct Shared {
  kind:    CollectionKind,
  working: Mutex<Working>,
}

impl Shared {
  fn new(kind: CollectionKind) -> Arc<Self> {
    Arc::new(Self {
      kind,
      working: Mutex::new(Working {
        records:  Vec::new(),
        state:    ViewState::Loading,
        revision: 0,
      }),
    })
  }

  fn lock(&self) -> MutexGuard<'_, Working> {
    self.working.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn seed(&self, initial: Vec<Record>) -> bool {
    let mut working = self.lock();
    if working.state != ViewState::Loading {
      tracing::debug!(kind = %self.kind, "binder already seeded");
      return false;
    }
    working.records = initial;
    working.state = ViewState::Ready;
    working.revision += 1;
    true
  }

  fn replace(&self, records: Vec<Record>) {
    let mut working = self.lock();
    if working.state == ViewState::Ready && working.records == records {
      return;
    }
    working.records = records;
    working.state = ViewState::Ready;
    working.revision += 1;
  }
}

// ─── Operations shared by the binder and its handles ─────────────────────────

fn apply_update(
  shared: &Shared,
  store: Option<&RecordStore>,
  updated: Record,
) -> bool {
  let to_save = {
    let mut working = shared.lock();
    let Some(slot) = working.records.iter_mut().find(|r| r.id == updated.id)
    else {
      tracing::debug!(
        kind = %shared.kind,
        id = %updated.id,
        "update for unknown record ignored"
      );
      return false;
    };
    slot.merge_from(updated);
    working.revision += 1;
    store.map(|_| working.records.clone())
  };

  // The lock is released before saving: the save broadcasts back into this
  // binder's own subscription.
  if let (Some(store), Some(records)) = (store, to_save) {
    store.save(&records);
  }
  true
}

fn append(
  shared: &Shared,
  store: Option<&RecordStore>,
  record: Record,
) -> Result<()> {
  let to_save = {
    let mut working = shared.lock();
    if working.records.iter().any(|r| r.id == record.id) {
      return Err(Error::DuplicateRecord(record.id));
    }
    working.records.push(record);
    working.revision += 1;
    store.map(|_| working.records.clone())
  };

  if let (Some(store), Some(records)) = (store, to_save) {
    store.save(&records);
  }
  Ok(())
}

// ─── ViewBinder ──────────────────────────────────────────────────────────────

/// A mounted view's working copy of one collection.
pub struct ViewBinder {
  shared:        Arc<Shared>,
  store:         Option<Arc<RecordStore>>,
  _subscription: Option<Subscription>,
}

impl ViewBinder {
  /// A binder whose collection is not backed by the record store, such as a
  /// list fetched from the API.
  pub fn detached(kind: CollectionKind) -> Self {
    Self { shared: Shared::new(kind), store: None, _subscription: None }
  }

  /// A binder over `store`'s collection, subscribed to its broadcasts for as
  /// long as the binder lives. Not seeded yet.
  pub fn store_backed(store: Arc<RecordStore>) -> Self {
    let shared = Shared::new(store.kind());
    let weak = Arc::downgrade(&shared);
    let subscription = store.subscribe(move |records: &[Record]| {
      if let Some(shared) = weak.upgrade() {
        shared.replace(records.to_vec());
      }
    });
    Self { shared, store: Some(store), _subscription: Some(subscription) }
  }

  /// [`store_backed`](Self::store_backed), seeded from
  /// [`RecordStore::load`].
  pub fn mount(store: Arc<RecordStore>) -> Self {
    let initial = store.load();
    let binder = Self::store_backed(store);
    binder.seed(initial);
    binder
  }

  pub fn kind(&self) -> CollectionKind { self.shared.kind }

  /// Set the initial working copy. Only the first call (before any broadcast
  /// arrives) takes effect; returns whether this one did.
  pub fn seed(&self, initial: Vec<Record>) -> bool {
    self.shared.seed(initial)
  }

  /// Mark the initial load as failed; the view renders an empty list.
  pub fn seed_failed(&self, message: impl Into<String>) {
    let mut working = self.shared.lock();
    if working.state != ViewState::Loading {
      return;
    }
    working.records.clear();
    working.state = ViewState::LoadFailed(message.into());
    working.revision += 1;
  }

  /// Merge `updated` into the record with the same id. Unknown ids are
  /// ignored. Returns whether a record was updated.
  pub fn apply_update(&self, updated: Record) -> bool {
    apply_update(&self.shared, self.store.as_deref(), updated)
  }

  /// Replace the working copy wholesale.
  pub fn apply_external_collection(&self, records: Vec<Record>) {
    self.shared.replace(records);
  }

  /// Add a newly created record to the end of the collection.
  pub fn append(&self, record: Record) -> Result<()> {
    append(&self.shared, self.store.as_deref(), record)
  }

  pub fn snapshot(&self) -> Vec<Record> { self.shared.lock().records.clone() }

  pub fn get(&self, id: &RecordId) -> Option<Record> {
    self.shared.lock().records.iter().find(|r| &r.id == id).cloned()
  }

  pub fn len(&self) -> usize { self.shared.lock().records.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn revision(&self) -> u64 { self.shared.lock().revision }

  pub fn state(&self) -> ViewState { self.shared.lock().state.clone() }

  /// A weak handle for continuations that may outlive the view.
  pub fn handle(&self) -> BinderHandle {
    BinderHandle {
      shared: Arc::downgrade(&self.shared),
      store:  self.store.clone(),
    }
  }
}

// ─── BinderHandle ────────────────────────────────────────────────────────────

/// A weak reference to a [`ViewBinder`]. Every operation is a no-op once the
/// binder has been dropped.
#[derive(Clone)]
pub struct BinderHandle {
  shared: Weak<Shared>,
  store:  Option<Arc<RecordStore>>,
}

impl BinderHandle {
  pub fn is_mounted(&self) -> bool { self.shared.strong_count() > 0 }

  /// See [`ViewBinder::apply_update`]. Returns `false` after unmount.
  pub fn apply_update(&self, updated: Record) -> bool {
    let Some(shared) = self.shared.upgrade() else {
      tracing::debug!(id = %updated.id, "update for unmounted view dropped");
      return false;
    };
    apply_update(&shared, self.store.as_deref(), updated)
  }

  /// See [`ViewBinder::seed`]. Returns `false` after unmount.
  pub fn seed(&self, initial: Vec<Record>) -> bool {
    self.shared.upgrade().is_some_and(|shared| shared.seed(initial))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{bus::NotificationBus, kv::MemoryKv, status::Status};

  fn apps() -> Vec<Record> {
    vec![
      Record::new("app1").with_status("pending").with_field("jobId", "job1"),
      Record::new("app2").with_status("reviewed").with_field("jobId", "job2"),
      Record::new("app3").with_status("pending").with_field("jobId", "job3"),
    ]
  }

  fn seeded() -> ViewBinder {
    let binder = ViewBinder::detached(CollectionKind::Applications);
    binder.seed(apps());
    binder
  }

  fn status_of(binder: &ViewBinder, id: &str) -> Option<String> {
    binder
      .get(&RecordId::from(id))
      .and_then(|r| r.status().map(Status::to_string))
  }

  #[test]
  fn update_replaces_in_place_and_keeps_count_and_order() {
    let binder = seeded();

    assert!(binder.apply_update(Record::new("app2").with_status("accepted")));

    let records = binder.snapshot();
    assert_eq!(records.len(), 3);
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["app1", "app2", "app3"]);
    assert_eq!(records.iter().filter(|r| r.id.as_str() == "app2").count(), 1);
    assert_eq!(status_of(&binder, "app2").as_deref(), Some("accepted"));
    assert_eq!(records[1].get_str("jobId"), Some("job2"));
  }

  #[test]
  fn update_for_unknown_id_changes_nothing() {
    let binder = seeded();
    let before = binder.snapshot();
    let revision = binder.revision();

    assert!(!binder.apply_update(Record::new("app99").with_status("accepted")));

    assert_eq!(binder.snapshot(), before);
    assert_eq!(binder.revision(), revision);
  }

  #[test]
  fn underscore_id_updates_match_canonical_records() {
    let binder = seeded();
    let update: Record = serde_json::from_value(serde_json::json!({
      "_id": "app3",
      "status": "rejected",
    }))
    .unwrap();

    assert!(binder.apply_update(update));
    assert_eq!(status_of(&binder, "app3").as_deref(), Some("rejected"));
  }

  #[test]
  fn seed_only_takes_effect_once() {
    let binder = seeded();
    assert!(!binder.seed(Vec::new()));
    assert_eq!(binder.len(), 3);
  }

  #[test]
  fn failed_load_renders_empty() {
    let binder = ViewBinder::detached(CollectionKind::Jobs);
    binder.seed_failed("Could not load jobs");

    assert!(binder.is_empty());
    assert_eq!(
      binder.state(),
      ViewState::LoadFailed("Could not load jobs".into())
    );
  }

  #[test]
  fn external_collection_replaces_wholesale() {
    let binder = seeded();
    binder.apply_external_collection(vec![Record::new("app7")]);
    assert_eq!(binder.snapshot(), vec![Record::new("app7")]);
  }

  #[test]
  fn append_rejects_duplicate_ids() {
    let binder = seeded();
    binder.append(Record::new("app4").with_status("pending")).unwrap();
    assert_eq!(binder.len(), 4);

    let err = binder.append(Record::new("app1")).unwrap_err();
    assert!(matches!(err, Error::DuplicateRecord(_)));
  }

  #[test]
  fn store_backed_update_saves_whole_collection() {
    let kv = Arc::new(MemoryKv::new());
    let store = Arc::new(RecordStore::new(
      CollectionKind::Applications,
      kv,
      NotificationBus::new(),
      apps(),
    ));
    let binder = ViewBinder::mount(Arc::clone(&store));

    binder.apply_update(Record::new("app1").with_status("accepted"));

    let persisted = store.load();
    assert_eq!(persisted.len(), 3);
    assert_eq!(persisted, binder.snapshot());
    assert_eq!(persisted[0].status().map(Status::as_str), Some("accepted"));
  }

  #[test]
  fn handle_is_a_no_op_after_unmount() {
    let binder = seeded();
    let handle = binder.handle();
    assert!(handle.is_mounted());

    drop(binder);

    assert!(!handle.is_mounted());
    assert!(!handle.apply_update(Record::new("app1").with_status("accepted")));
  }

  #[test]
  fn dropping_a_binder_releases_its_subscription() {
    let bus = NotificationBus::new();
    let store = Arc::new(RecordStore::new(
      CollectionKind::Applications,
      Arc::new(MemoryKv::new()),
      bus.clone(),
      apps(),
    ));
    let topic = CollectionKind::Applications.topic();

    let binder = ViewBinder::mount(Arc::clone(&store));
    assert_eq!(bus.subscriber_count(&topic), 1);
    drop(binder);
    assert_eq!(bus.subscriber_count(&topic), 0);
  }
}
