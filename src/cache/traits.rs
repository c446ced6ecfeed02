//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be cached.
///
/// Implementors provide a stable identity used for single-item upsert/remove.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this entity (e.g., idea id)
  fn cache_key(&self) -> &str;

  /// Collection name used to namespace storage keys (e.g., "ideas")
  fn entity_type() -> &'static str;
}

/// A cached collection with the time it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
  /// The cached entities in order
  pub items: Vec<T>,
  /// When the snapshot was written
  pub captured_at: DateTime<Utc>,
}

/// Source of "now" for staleness decisions.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Indicates where the data currently shown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Nothing loaded yet
  None,
  /// Provisional data from a valid cache snapshot, network fetch in flight or failed
  Cache,
  /// Fresh data from network
  Network,
}
