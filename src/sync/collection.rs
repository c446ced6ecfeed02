//! Read-through controller for the ideas collection.
//!
//! On refetch the controller shows the cached snapshot right away (if one is
//! still valid) and revalidates against the server in the background. Writes
//! go to the server first; only the server's representation is applied to
//! memory and the cache.
//!
//! A write the server confirms while a list fetch is in flight is replayed
//! over that fetch's result, so an older list cannot erase it.

use tracing::debug;

use crate::api::{Idea, IdeasClient, UploadFile};
use crate::cache::{CacheSource, CacheStore};
use crate::error::{ApiError, ApiResult};
use crate::query::{Query, QueryState};

/// Lifecycle of the collection as seen by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
  /// Never fetched
  Idle,
  /// Fetch in flight and nothing to show yet
  Loading,
  /// Data available (possibly provisional, see `source()`)
  ///
  /// `error()` keeps the last failed fetch's error until the server answers
  /// again, so a cached snapshot can be `Ready` with an error still set.
  Ready,
  /// Last fetch failed; previously shown data is kept
  Failed,
}

/// A server-confirmed write that landed while a list fetch was in flight.
#[derive(Debug, Clone)]
enum ConfirmedWrite {
  Created(Idea),
  Updated(Idea),
  Deleted(String),
}

impl ConfirmedWrite {
  fn replay(self, items: &mut Vec<Idea>) {
    match self {
      ConfirmedWrite::Created(idea) => {
        items.retain(|existing| existing.id != idea.id);
        items.insert(0, idea);
      }
      ConfirmedWrite::Updated(idea) => {
        if let Some(existing) = items.iter_mut().find(|existing| existing.id == idea.id) {
          *existing = idea;
        }
      }
      ConfirmedWrite::Deleted(id) => items.retain(|existing| existing.id != id),
    }
  }
}

pub struct CollectionController {
  client: IdeasClient,
  cache: CacheStore<Idea>,
  query: Query<Vec<Idea>>,
  status: SyncStatus,
  items: Vec<Idea>,
  source: CacheSource,
  error: Option<ApiError>,
  confirmed: Vec<ConfirmedWrite>,
}

impl CollectionController {
  pub fn new(client: IdeasClient, cache: CacheStore<Idea>) -> Self {
    let fetch_client = client.clone();
    let query = Query::new(move || {
      let client = fetch_client.clone();
      async move { client.list_ideas().await }
    });

    Self {
      client,
      cache,
      query,
      status: SyncStatus::Idle,
      items: Vec::new(),
      source: CacheSource::None,
      error: None,
      confirmed: Vec::new(),
    }
  }

  pub fn status(&self) -> SyncStatus {
    self.status
  }

  pub fn items(&self) -> &[Idea] {
    &self.items
  }

  pub fn source(&self) -> CacheSource {
    self.source
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  pub fn clear_error(&mut self) {
    self.error = None;
  }

  /// Whether a background list fetch is in flight.
  pub fn is_revalidating(&self) -> bool {
    self.query.is_loading()
  }

  /// Show cached data immediately (if valid) and start a background fetch.
  ///
  /// Called on mount and on explicit refresh. A fetch already in flight is
  /// superseded; its late result is dropped.
  pub fn refetch(&mut self) {
    match self.cache.read() {
      Some(snapshot) => {
        debug!(count = snapshot.items.len(), "serving cached ideas while revalidating");
        self.items = snapshot.items;
        self.source = CacheSource::Cache;
        self.status = SyncStatus::Ready;
      }
      None => {
        self.status = SyncStatus::Loading;
      }
    }
    self.confirmed.clear();
    self.query.refetch();
  }

  /// Apply a finished background fetch, if any. Returns `true` on change.
  pub fn poll(&mut self) -> bool {
    if self.query.poll() {
      self.apply_fetch_result();
      true
    } else {
      false
    }
  }

  /// Wait for the in-flight background fetch and apply it.
  pub async fn settle(&mut self) -> bool {
    if self.query.settle().await {
      self.apply_fetch_result();
      true
    } else {
      false
    }
  }

  fn apply_fetch_result(&mut self) {
    let confirmed = std::mem::take(&mut self.confirmed);
    match self.query.state() {
      QueryState::Success(items) => {
        let mut items = items.clone();
        if !confirmed.is_empty() {
          debug!(count = confirmed.len(), "replaying writes confirmed during fetch");
        }
        for write in confirmed {
          write.replay(&mut items);
        }
        self.cache.write(&items);
        self.items = items;
        self.source = CacheSource::Network;
        self.status = SyncStatus::Ready;
        self.error = None;
      }
      QueryState::Error(error) => {
        debug!(%error, kept = self.items.len(), "ideas fetch failed; keeping last known data");
        self.error = Some(error.clone());
        self.status = SyncStatus::Failed;
      }
      QueryState::Idle | QueryState::Loading => {}
    }
  }

  /// Create an idea on the server and prepend the server's copy.
  ///
  /// Nothing is shown until the server answers: the id is server-assigned.
  pub async fn create(&mut self, transcript: &str) -> ApiResult<Idea> {
    let result = self.client.create_idea(transcript).await;
    self.apply_created(result)
  }

  fn apply_created(&mut self, result: ApiResult<Idea>) -> ApiResult<Idea> {
    match result {
      Ok(idea) => {
        self.items.retain(|existing| existing.id != idea.id);
        self.items.insert(0, idea.clone());
        self.cache.upsert(&idea);
        self.record(ConfirmedWrite::Created(idea.clone()));
        Ok(idea)
      }
      Err(error) => {
        self.error = Some(error.clone());
        Err(error)
      }
    }
  }

  /// Remember a confirmed write if a list fetch could still overwrite it.
  fn record(&mut self, write: ConfirmedWrite) {
    if self.query.is_loading() {
      self.confirmed.push(write);
    }
  }

  /// Upload a voice memo; the server transcribes it into a new idea.
  pub async fn create_from_audio(&mut self, file: UploadFile) -> ApiResult<Idea> {
    let result = self.client.create_idea_from_audio(file).await;
    self.apply_created(result)
  }

  /// Update a transcript and replace the local copy with the server's.
  pub async fn update(&mut self, id: &str, transcript: &str) -> ApiResult<Idea> {
    match self.client.update_idea(id, transcript).await {
      Ok(idea) => {
        if let Some(existing) = self.items.iter_mut().find(|existing| existing.id == idea.id) {
          *existing = idea.clone();
        }
        self.cache.upsert(&idea);
        self.record(ConfirmedWrite::Updated(idea.clone()));
        Ok(idea)
      }
      Err(error) => {
        self.error = Some(error.clone());
        Err(error)
      }
    }
  }

  /// Delete an idea on the server, then drop it locally.
  pub async fn delete(&mut self, id: &str) -> ApiResult<()> {
    match self.client.delete_idea(id).await {
      Ok(()) => {
        self.items.retain(|existing| existing.id != id);
        self.cache.remove(id);
        self.record(ConfirmedWrite::Deleted(id.to_string()));
        Ok(())
      }
      Err(error) => {
        self.error = Some(error.clone());
        Err(error)
      }
    }
  }
}
