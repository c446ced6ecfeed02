//! Persistent cache for collection snapshots.
//!
//! This module provides an entity-agnostic caching mechanism that:
//! - Stores one ordered snapshot per collection plus a timestamp mirror
//! - Treats snapshots older than the TTL as absent (lazy expiry)
//! - Supports single-item upsert/remove that refresh the freshness window
//! - Never surfaces storage failures to callers

mod storage;
mod store;
mod traits;

pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use store::{CacheStore, DEFAULT_TTL_MS};
pub use traits::{CacheSource, Cacheable, Clock, Snapshot, SystemClock};

#[cfg(test)]
pub use traits::test_clock::ManualClock;
