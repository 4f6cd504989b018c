//! Integration tests for `SqliteKv` against in-memory and on-disk databases.

use std::sync::Arc;

use placement_core::{
  binder::ViewBinder,
  bus::NotificationBus,
  kv::KeyValueStore,
  record::{Record, RecordId},
  seed,
  status::{CollectionKind, Status},
  store::RecordStore,
};

use crate::SqliteKv;

fn store() -> SqliteKv { SqliteKv::open_in_memory().expect("in-memory store") }

fn temp_path(name: &str) -> std::path::PathBuf {
  std::env::temp_dir()
    .join(format!("placement-store-{}-{name}", std::process::id()))
    .join("store.db")
}

// ─── Key-value semantics ─────────────────────────────────────────────────────

#[test]
fn missing_key_reads_as_none() {
  let kv = store();
  assert_eq!(kv.get("nothing").unwrap(), None);
}

#[test]
fn set_overwrites_previous_value() {
  let kv = store();
  kv.set("k", "one").unwrap();
  kv.set("k", "two").unwrap();

  assert_eq!(kv.get("k").unwrap().as_deref(), Some("two"));
  assert_eq!(kv.keys().unwrap(), ["k"]);
}

#[test]
fn remove_deletes_and_is_idempotent() {
  let kv = store();
  kv.set("k", "v").unwrap();
  kv.remove("k").unwrap();
  kv.remove("k").unwrap();

  assert_eq!(kv.get("k").unwrap(), None);
}

#[test]
fn values_are_stored_verbatim() {
  let kv = store();
  let raw = r#"[{"id":"app1","note":"naïve \"quoted\""}]"#;
  kv.set("placement_applications_v1", raw).unwrap();
  assert_eq!(
    kv.get("placement_applications_v1").unwrap().as_deref(),
    Some(raw)
  );
}

// ─── Persistence across opens ────────────────────────────────────────────────

#[test]
fn data_survives_reopen() {
  let path = temp_path("reopen");
  let _ = std::fs::remove_file(&path);

  SqliteKv::open(&path).unwrap().set("k", "v").unwrap();
  let reopened = SqliteKv::open(&path).unwrap();

  assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
  drop(reopened);
  let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn record_store_changes_survive_restart() {
  let path = temp_path("records");
  let _ = std::fs::remove_file(&path);

  {
    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKv::open(&path).unwrap());
    let store = Arc::new(RecordStore::new(
      CollectionKind::Applications,
      kv,
      NotificationBus::new(),
      seed::applications(),
    ));
    let view = ViewBinder::mount(store);
    assert!(view.apply_update(Record::new("app1").with_status("accepted")));
  }

  let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKv::open(&path).unwrap());
  let store = RecordStore::new(
    CollectionKind::Applications,
    kv,
    NotificationBus::new(),
    Vec::new(),
  );
  let records = store.load();
  assert_eq!(records.len(), 5);
  let app1 = records.iter().find(|r| r.id == RecordId::from("app1")).unwrap();
  assert_eq!(app1.status().map(Status::as_str), Some("accepted"));

  let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn stored_collection_is_a_json_array() {
  let kv = Arc::new(store());
  let store = RecordStore::new(
    CollectionKind::Jobs,
    kv.clone(),
    NotificationBus::new(),
    seed::jobs(),
  );
  store.load();

  let raw = kv.get(CollectionKind::Jobs.storage_key()).unwrap().unwrap();
  let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(parsed.as_array().map(Vec::len), Some(4));
  assert_eq!(parsed[0]["id"], "job1");
}
