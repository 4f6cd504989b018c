//! [`RecordStore`]: whole-collection persistence with change broadcast.
//!
//! One collection kind maps to one storage key. Every save overwrites the
//! entire collection and then publishes it on the kind's topic, so keeping
//! records consistent is the caller's job: always save the full
//! post-mutation collection.

use std::sync::Arc;

use crate::{
  Result,
  bus::{NotificationBus, Subscription},
  kv::KeyValueStore,
  record::{self, Record},
  status::CollectionKind,
};

/// Persisted record collection of a single [`CollectionKind`].
///
/// Neither [`load`](Self::load) nor [`save`](Self::save) ever fails: storage
/// problems are logged and the store degrades to seed data on read and to
/// in-memory-only on write.
pub struct RecordStore {
  kind: CollectionKind,
  kv:   Arc<dyn KeyValueStore>,
  bus:  NotificationBus,
  seed: Vec<Record>,
}

impl RecordStore {
  pub fn new(
    kind: CollectionKind,
    kv: Arc<dyn KeyValueStore>,
    bus: NotificationBus,
    seed: Vec<Record>,
  ) -> Self {
    let seed = record::normalize_all(kind, seed);
    Self { kind, kv, bus, seed }
  }

  pub fn kind(&self) -> CollectionKind { self.kind }

  /// Return the persisted collection, writing the seed first if nothing has
  /// been persisted yet.
  pub fn load(&self) -> Vec<Record> {
    match self.try_load() {
      Ok(Some(records)) => records,
      Ok(None) => {
        if let Err(e) = self.write(&self.seed) {
          tracing::warn!(
            kind = %self.kind,
            error = %e,
            "could not persist seed collection"
          );
        }
        self.seed.clone()
      }
      Err(e) => {
        tracing::warn!(
          kind = %self.kind,
          error = %e,
          "persisted collection unreadable; using seed"
        );
        self.seed.clone()
      }
    }
  }

  /// Overwrite the persisted collection with `records`, then broadcast it.
  ///
  /// Returns `false` if the write failed, in which case nothing was
  /// broadcast.
  pub fn save(&self, records: &[Record]) -> bool {
    if let Err(e) = self.write(records) {
      tracing::error!(
        kind = %self.kind,
        records = records.len(),
        error = %e,
        "could not persist collection; changes are in-memory only"
      );
      return false;
    }
    self.bus.publish(&self.kind.topic(), records);
    true
  }

  /// Subscribe to full-collection broadcasts for this store's kind.
  pub fn subscribe<F>(&self, handler: F) -> Subscription
  where
    F: Fn(&[Record]) + Send + Sync + 'static,
  {
    self.bus.subscribe(self.kind.topic(), handler)
  }

  fn try_load(&self) -> Result<Option<Vec<Record>>> {
    let Some(raw) = self.kv.get(self.kind.storage_key())? else {
      return Ok(None);
    };
    Ok(Some(record::decode_collection(self.kind, &raw)?))
  }

  fn write(&self, records: &[Record]) -> Result<()> {
    let raw = serde_json::to_string(records)?;
    self.kv.set(self.kind.storage_key(), &raw)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::kv::MemoryKv;

  fn seed() -> Vec<Record> {
    vec![
      Record::new("app1").with_status("pending").with_field("jobId", "job1"),
      Record::new("app2").with_status("reviewed").with_field("jobId", "job2"),
    ]
  }

  fn store_over(kv: &Arc<MemoryKv>, bus: &NotificationBus) -> RecordStore {
    RecordStore::new(
      CollectionKind::Applications,
      Arc::clone(kv) as Arc<dyn KeyValueStore>,
      bus.clone(),
      seed(),
    )
  }

  #[test]
  fn first_load_persists_the_seed() {
    let kv = Arc::new(MemoryKv::new());
    let store = store_over(&kv, &NotificationBus::new());

    let first = store.load();
    assert_eq!(first, seed());
    assert!(kv.get("placement_applications_v1").unwrap().is_some());

    // Once something else is persisted, load returns it instead of the seed.
    let changed = vec![Record::new("app9").with_status("pending")];
    assert!(store.save(&changed));
    assert_eq!(store.load(), changed);
  }

  #[test]
  fn save_of_load_leaves_content_unchanged() {
    let kv = Arc::new(MemoryKv::new());
    let store = store_over(&kv, &NotificationBus::new());
    store.load();
    let before = kv.get("placement_applications_v1").unwrap();

    assert!(store.save(&store.load()));

    assert_eq!(kv.get("placement_applications_v1").unwrap(), before);
  }

  #[test]
  fn corrupt_storage_degrades_to_seed() {
    let kv = Arc::new(MemoryKv::new());
    kv.set("placement_applications_v1", "{not json").unwrap();
    let store = store_over(&kv, &NotificationBus::new());

    assert_eq!(store.load(), seed());
  }

  #[test]
  fn unavailable_storage_degrades_to_seed() {
    let kv = Arc::new(MemoryKv::new());
    kv.set_failing(true);
    let store = store_over(&kv, &NotificationBus::new());

    assert_eq!(store.load(), seed());
  }

  #[test]
  fn save_broadcasts_the_full_collection() {
    let kv = Arc::new(MemoryKv::new());
    let bus = NotificationBus::new();
    let store = store_over(&kv, &bus);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = store.subscribe(move |records: &[Record]| {
      *sink.lock().unwrap() = records.to_vec();
    });

    let mut records = store.load();
    records[0] = records[0].clone().with_status("accepted");
    assert!(store.save(&records));

    assert_eq!(*seen.lock().unwrap(), records);
  }

  #[test]
  fn failed_save_does_not_broadcast() {
    let kv = Arc::new(MemoryKv::new());
    let bus = NotificationBus::new();
    let store = store_over(&kv, &bus);
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let _sub = store.subscribe(move |_: &[Record]| {
      *counter.lock().unwrap() += 1;
    });

    kv.set_failing(true);
    assert!(!store.save(&seed()));

    assert_eq!(*calls.lock().unwrap(), 0);
  }

  #[test]
  fn loaded_records_are_normalised() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(
      "placement_applications_v1",
      r#"[{"_id":"app1","status":"Hired"},{"id":3}]"#,
    )
    .unwrap();
    let store = store_over(&kv, &NotificationBus::new());

    let records = store.load();
    assert_eq!(records[0].id.as_str(), "app1");
    assert_eq!(records[0].status().map(|s| s.as_str()), Some("accepted"));
    assert_eq!(records[1].id.as_str(), "3");
    assert_eq!(records[1].status().map(|s| s.as_str()), Some("pending"));
  }
}
