//! Single-idea view with not-found semantics.

use crate::api::{Idea, IdeasClient};
use crate::cache::CacheStore;
use crate::error::ApiError;

/// What is known about one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity<T> {
  /// Not loaded yet (or only failed transiently so far)
  Unknown,
  Found(T),
  /// The server says it does not exist (deleted or never created)
  Missing,
}

impl<T> Entity<T> {
  pub fn get(&self) -> Option<&T> {
    match self {
      Entity::Found(value) => Some(value),
      _ => None,
    }
  }

  pub fn is_missing(&self) -> bool {
    matches!(self, Entity::Missing)
  }
}

/// Detail state for one idea.
///
/// `Missing` together with an error means the idea is gone; an error with the
/// entity untouched means the fetch failed for some other reason.
pub struct IdeaDetail {
  client: IdeasClient,
  cache: CacheStore<Idea>,
  id: String,
  entity: Entity<Idea>,
  error: Option<ApiError>,
}

impl IdeaDetail {
  /// Starts from the cached copy when the list snapshot has one.
  pub fn new(client: IdeasClient, cache: CacheStore<Idea>, id: impl Into<String>) -> Self {
    let id = id.into();
    let entity = match cache.find(&id) {
      Some(idea) => Entity::Found(idea),
      None => Entity::Unknown,
    };

    Self {
      client,
      cache,
      id,
      entity,
      error: None,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn entity(&self) -> &Entity<Idea> {
    &self.entity
  }

  pub fn idea(&self) -> Option<&Idea> {
    self.entity.get()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  /// Fetch the idea from the server. Never fails; check `entity()` and `error()`.
  pub async fn load(&mut self) {
    match self.client.get_idea(&self.id).await {
      Ok(idea) => {
        self.entity = Entity::Found(idea);
        self.error = None;
      }
      Err(error) if error.is_not_found() => {
        self.entity = Entity::Missing;
        self.cache.remove(&self.id);
        self.error = Some(error);
      }
      Err(error) => {
        self.error = Some(error);
      }
    }
  }
}
