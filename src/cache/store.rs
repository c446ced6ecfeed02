//! TTL-bounded snapshot store for one cached collection.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use super::storage::CacheStorage;
use super::traits::{Cacheable, Clock, Snapshot, SystemClock};

/// Default snapshot lifetime: 5 minutes.
pub const DEFAULT_TTL_MS: i64 = 300_000;

/// On-disk form of a snapshot. Items and timestamp travel in one value so a
/// reader can never pair new items with an old timestamp.
#[derive(Serialize, Deserialize)]
struct StoredSnapshot<T> {
  items: Vec<T>,
  timestamp: i64,
}

/// Best-effort cache for a single collection.
///
/// Every operation swallows storage failures (logged at `warn`) so the cache
/// can never be the reason a user-visible operation fails. Readers treat a
/// snapshot older than the TTL as absent; it stays in storage until the next
/// write replaces it.
///
/// Read-modify-write operations (`upsert`, `remove`) are not locked across the
/// read and the write. Two concurrent mutations resolve last-writer-wins.
pub struct CacheStore<T> {
  storage: Arc<dyn CacheStorage>,
  clock: Arc<dyn Clock>,
  ttl: Duration,
  _entity: PhantomData<fn() -> T>,
}

impl<T: Cacheable> CacheStore<T> {
  /// Create a new cache store over the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      clock: Arc::new(SystemClock),
      ttl: Duration::milliseconds(DEFAULT_TTL_MS),
      _entity: PhantomData,
    }
  }

  /// Set how long a snapshot stays valid.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  fn snapshot_key() -> String {
    format!("{}:snapshot", T::entity_type())
  }

  fn timestamp_key() -> String {
    format!("{}:timestamp", T::entity_type())
  }

  fn is_valid(&self, captured_at: DateTime<Utc>) -> bool {
    self.clock.now() - captured_at < self.ttl
  }

  /// Current snapshot, or `None` if never written, unreadable, or expired.
  pub fn read(&self) -> Option<Snapshot<T>> {
    let raw = match self.storage.get(&Self::snapshot_key()) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!("cache read failed for {}: {}", T::entity_type(), e);
        return None;
      }
    };

    let stored: StoredSnapshot<T> = match serde_json::from_str(&raw) {
      Ok(stored) => stored,
      Err(e) => {
        warn!("discarding unreadable {} snapshot: {}", T::entity_type(), e);
        return None;
      }
    };

    let captured_at = Utc.timestamp_millis_opt(stored.timestamp).single()?;
    if !self.is_valid(captured_at) {
      return None;
    }

    Some(Snapshot {
      items: stored.items,
      captured_at,
    })
  }

  /// Replace the snapshot wholesale, stamped with the current time.
  pub fn write(&self, items: &[T]) {
    let timestamp = self.clock.now().timestamp_millis();
    let stored = StoredSnapshot {
      items: items.to_vec(),
      timestamp,
    };

    let json = match serde_json::to_string(&stored) {
      Ok(json) => json,
      Err(e) => {
        warn!("failed to serialize {} snapshot: {}", T::entity_type(), e);
        return;
      }
    };
    let timestamp = timestamp.to_string();
    let snapshot_key = Self::snapshot_key();
    let timestamp_key = Self::timestamp_key();

    if let Err(e) = self.storage.set_many(&[
      (snapshot_key.as_str(), json.as_str()),
      (timestamp_key.as_str(), timestamp.as_str()),
    ]) {
      warn!("cache write failed for {}: {}", T::entity_type(), e);
    }
  }

  /// Insert or replace one item, refreshing the snapshot's freshness window.
  ///
  /// An existing entry keeps its position; a new one is prepended. With no
  /// valid snapshot the result holds just this item.
  pub fn upsert(&self, item: &T) {
    let mut items = self.read().map(|s| s.items).unwrap_or_default();

    match items
      .iter()
      .position(|existing| existing.cache_key() == item.cache_key())
    {
      Some(pos) => items[pos] = item.clone(),
      None => items.insert(0, item.clone()),
    }

    self.write(&items);
  }

  /// Drop one item from a valid snapshot. No-op when there is nothing cached.
  pub fn remove(&self, key: &str) {
    let Some(snapshot) = self.read() else {
      return;
    };

    let items: Vec<T> = snapshot
      .items
      .into_iter()
      .filter(|item| item.cache_key() != key)
      .collect();

    self.write(&items);
  }

  /// Delete the snapshot and its timestamp mirror.
  pub fn clear(&self) {
    let snapshot_key = Self::snapshot_key();
    let timestamp_key = Self::timestamp_key();

    if let Err(e) = self
      .storage
      .remove_many(&[snapshot_key.as_str(), timestamp_key.as_str()])
    {
      warn!("cache clear failed for {}: {}", T::entity_type(), e);
    }
  }

  /// Look up one item in the current valid snapshot.
  pub fn find(&self, key: &str) -> Option<T> {
    self
      .read()?
      .items
      .into_iter()
      .find(|item| item.cache_key() == key)
  }

  /// When the snapshot was last written, valid or not.
  pub fn last_updated(&self) -> Option<DateTime<Utc>> {
    match self.storage.get(&Self::timestamp_key()) {
      Ok(raw) => raw
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
      Err(e) => {
        warn!("cache timestamp read failed for {}: {}", T::entity_type(), e);
        None
      }
    }
  }
}

impl<T> Clone for CacheStore<T> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      ttl: self.ttl,
      _entity: PhantomData,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::SqliteStorage;
  use crate::cache::traits::test_clock::ManualClock;
  use color_eyre::{eyre::eyre, Result};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Note {
    id: String,
    text: String,
  }

  impl Cacheable for Note {
    fn cache_key(&self) -> &str {
      &self.id
    }

    fn entity_type() -> &'static str {
      "notes"
    }
  }

  fn note(id: &str, text: &str) -> Note {
    Note {
      id: id.to_string(),
      text: text.to_string(),
    }
  }

  fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
  }

  fn store() -> (CacheStore<Note>, Arc<ManualClock>, Arc<SqliteStorage>) {
    let clock = Arc::new(ManualClock::new(start()));
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let store = CacheStore::new(storage.clone()).with_clock(clock.clone());
    (store, clock, storage)
  }

  fn ids(items: &[Note]) -> Vec<&str> {
    items.iter().map(|n| n.id.as_str()).collect()
  }

  #[test]
  fn test_read_empty_is_absent() {
    let (store, _, _) = store();
    assert!(store.read().is_none());
    assert!(store.last_updated().is_none());
  }

  #[test]
  fn test_write_then_read() {
    let (store, _, _) = store();
    store.write(&[note("1", "a"), note("2", "b")]);

    let snapshot = store.read().unwrap();
    assert_eq!(ids(&snapshot.items), vec!["1", "2"]);
    assert_eq!(snapshot.captured_at, start());
    assert_eq!(store.last_updated(), Some(start()));
  }

  #[test]
  fn test_ttl_boundaries() {
    let (store, clock, _) = store();
    store.write(&[note("1", "a")]);

    clock.advance(Duration::milliseconds(DEFAULT_TTL_MS - 1));
    assert!(store.read().is_some());

    clock.advance(Duration::milliseconds(2));
    assert!(store.read().is_none());
  }

  #[test]
  fn test_expired_snapshot_is_not_deleted() {
    let (store, clock, storage) = store();
    store.write(&[note("1", "a")]);
    clock.advance(Duration::minutes(10));

    assert!(store.read().is_none());
    assert!(storage.get("notes:snapshot").unwrap().is_some());
    assert_eq!(store.last_updated(), Some(start()));
  }

  #[test]
  fn test_upsert_into_empty_cache() {
    let (store, _, _) = store();
    store.upsert(&note("1", "a"));

    let snapshot = store.read().unwrap();
    assert_eq!(snapshot.items, vec![note("1", "a")]);
  }

  #[test]
  fn test_upsert_prepends_new_item() {
    let (store, _, _) = store();
    store.write(&[note("1", "a"), note("2", "b")]);
    store.upsert(&note("3", "c"));

    assert_eq!(ids(&store.read().unwrap().items), vec!["3", "1", "2"]);
  }

  #[test]
  fn test_upsert_is_idempotent_and_in_place() {
    let (store, _, _) = store();
    store.write(&[note("1", "a"), note("2", "b"), note("3", "c")]);

    store.upsert(&note("2", "changed"));
    store.upsert(&note("2", "changed"));

    let items = store.read().unwrap().items;
    assert_eq!(ids(&items), vec!["1", "2", "3"]);
    assert_eq!(items[1].text, "changed");
  }

  #[test]
  fn test_upsert_refreshes_expired_snapshot() {
    let (store, clock, _) = store();
    store.write(&[note("1", "a")]);
    clock.advance(Duration::minutes(6));
    assert!(store.read().is_none());

    store.upsert(&note("2", "b"));

    let snapshot = store.read().unwrap();
    assert_eq!(ids(&snapshot.items), vec!["2"]);
    assert_eq!(snapshot.captured_at, start() + Duration::minutes(6));
  }

  #[test]
  fn test_upsert_extends_freshness_window() {
    let (store, clock, _) = store();
    store.write(&[note("1", "a")]);

    clock.advance(Duration::minutes(4));
    store.upsert(&note("1", "a2"));
    clock.advance(Duration::minutes(4));

    let snapshot = store.read().unwrap();
    assert_eq!(snapshot.items[0].text, "a2");
  }

  #[test]
  fn test_remove_filters_item() {
    let (store, _, _) = store();
    store.write(&[note("1", "a"), note("2", "b"), note("3", "c")]);
    store.remove("2");

    assert_eq!(ids(&store.read().unwrap().items), vec!["1", "3"]);
  }

  #[test]
  fn test_remove_without_snapshot_is_noop() {
    let (store, _, storage) = store();
    store.remove("1");
    assert!(storage.get("notes:snapshot").unwrap().is_none());
  }

  #[test]
  fn test_timestamp_mirror_tracks_every_mutation() {
    let (store, clock, storage) = store();
    store.write(&[note("1", "a")]);
    clock.advance(Duration::seconds(30));
    store.upsert(&note("2", "b"));
    clock.advance(Duration::seconds(30));
    store.remove("1");

    let raw = storage.get("notes:snapshot").unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let mirror: i64 = storage
      .get("notes:timestamp")
      .unwrap()
      .unwrap()
      .parse()
      .unwrap();

    assert_eq!(stored["timestamp"].as_i64(), Some(mirror));
    assert_eq!(stored["items"].as_array().unwrap().len(), 1);
    assert_eq!(mirror, (start() + Duration::seconds(60)).timestamp_millis());
  }

  #[test]
  fn test_clear_removes_both_keys() {
    let (store, _, storage) = store();
    store.write(&[note("1", "a")]);
    store.clear();

    assert!(store.read().is_none());
    assert!(storage.get("notes:snapshot").unwrap().is_none());
    assert!(storage.get("notes:timestamp").unwrap().is_none());
  }

  #[test]
  fn test_find() {
    let (store, _, _) = store();
    store.write(&[note("1", "a"), note("2", "b")]);

    assert_eq!(store.find("2"), Some(note("2", "b")));
    assert_eq!(store.find("9"), None);
  }

  #[test]
  fn test_custom_ttl() {
    let (store, clock, _) = store();
    let store = store.with_ttl(Duration::seconds(10));
    store.write(&[note("1", "a")]);

    clock.advance(Duration::seconds(11));
    assert!(store.read().is_none());
  }

  #[test]
  fn test_corrupt_snapshot_reads_as_absent() {
    let (store, _, storage) = store();
    storage
      .set_many(&[("notes:snapshot", "{not json")])
      .unwrap();

    assert!(store.read().is_none());
    store.upsert(&note("1", "a"));
    assert_eq!(ids(&store.read().unwrap().items), vec!["1"]);
  }

  struct BrokenStorage;

  impl CacheStorage for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
      Err(eyre!("disk on fire"))
    }

    fn set_many(&self, _entries: &[(&str, &str)]) -> Result<()> {
      Err(eyre!("disk on fire"))
    }

    fn remove_many(&self, _keys: &[&str]) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
  }

  #[test]
  fn test_storage_errors_are_swallowed() {
    let store: CacheStore<Note> = CacheStore::new(Arc::new(BrokenStorage));

    store.write(&[note("1", "a")]);
    store.upsert(&note("2", "b"));
    store.remove("1");
    store.clear();

    assert!(store.read().is_none());
    assert!(store.find("1").is_none());
    assert!(store.last_updated().is_none());
  }
}
