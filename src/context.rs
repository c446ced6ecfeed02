//! Application context: the one place that wires auth, dispatch and cache.
//!
//! Build it once at startup with [`AppContext::init`], hand controllers out
//! from it, and call [`AppContext::teardown`] on sign-out.

use chrono::Duration;
use color_eyre::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{Dispatcher, Idea, IdeasClient};
use crate::auth::{AuthProvider, SessionStatus};
use crate::cache::{CacheStorage, CacheStore, NoopStorage, SqliteStorage};
use crate::config::Config;
use crate::sync::{CollectionController, IdeaDetail, SearchController, StatsController};

pub struct AppContext {
  config: Config,
  auth: Arc<dyn AuthProvider>,
  client: IdeasClient,
  cache: CacheStore<Idea>,
  session_watcher: Option<JoinHandle<()>>,
}

impl AppContext {
  /// Open the configured cache storage and build the dispatcher.
  pub fn init(config: Config, auth: Arc<dyn AuthProvider>) -> Result<Self> {
    let storage: Arc<dyn CacheStorage> = if config.cache.enabled {
      Arc::new(SqliteStorage::open(&config.cache_path()?)?)
    } else {
      Arc::new(NoopStorage)
    };

    Ok(Self::with_storage(config, auth, storage))
  }

  /// Build a context over an explicit storage backend.
  pub fn with_storage(
    config: Config,
    auth: Arc<dyn AuthProvider>,
    storage: Arc<dyn CacheStorage>,
  ) -> Self {
    let dispatcher = Dispatcher::new(config.api.base_url.clone(), auth.clone());
    let client = IdeasClient::new(dispatcher);
    let ttl_secs = i64::try_from(config.cache.ttl_secs)
      .unwrap_or(i64::MAX)
      .min(i64::MAX / 1000);
    let cache = CacheStore::new(storage).with_ttl(Duration::seconds(ttl_secs));

    Self {
      config,
      auth,
      client,
      cache,
      session_watcher: None,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn auth(&self) -> &Arc<dyn AuthProvider> {
    &self.auth
  }

  pub fn client(&self) -> &IdeasClient {
    &self.client
  }

  pub fn cache(&self) -> &CacheStore<Idea> {
    &self.cache
  }

  pub fn collection(&self) -> CollectionController {
    CollectionController::new(self.client.clone(), self.cache.clone())
  }

  pub fn detail(&self, id: impl Into<String>) -> IdeaDetail {
    IdeaDetail::new(self.client.clone(), self.cache.clone(), id)
  }

  pub fn search(&self) -> SearchController {
    SearchController::new(self.client.clone())
  }

  pub fn stats(&self) -> StatsController {
    StatsController::new(self.client.clone())
  }

  /// Clear the cache whenever the auth provider reports a sign-out.
  ///
  /// Must be called from within a tokio runtime.
  pub fn watch_session(&mut self) {
    if self.session_watcher.is_some() {
      return;
    }

    let mut changes = self.auth.session_changes();
    let cache = self.cache.clone();
    self.session_watcher = Some(tokio::spawn(async move {
      while changes.changed().await.is_ok() {
        let status = *changes.borrow_and_update();
        if status == SessionStatus::SignedOut {
          info!("session ended; clearing cached ideas");
          cache.clear();
        }
      }
    }));
  }

  /// Sign-out cleanup: drop cached data and stop watching the session.
  pub fn teardown(&mut self) {
    if let Some(handle) = self.session_watcher.take() {
      handle.abort();
    }
    self.cache.clear();
  }
}

impl Drop for AppContext {
  fn drop(&mut self) {
    if let Some(handle) = self.session_watcher.take() {
      handle.abort();
    }
  }
}
