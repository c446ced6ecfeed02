//! Semantic search façade.

use crate::api::{IdeasClient, SearchResponse, SearchResult};
use crate::error::ApiError;
use crate::query::{Query, QueryState};

/// Holds the latest search response for one search box.
///
/// Each `search()` starts a fresh background query; a newer search supersedes
/// one still in flight, so results for an outdated query never land.
pub struct SearchController {
  client: IdeasClient,
  pending: Option<Query<SearchResponse>>,
  response: SearchResponse,
  error: Option<ApiError>,
}

impl SearchController {
  pub fn new(client: IdeasClient) -> Self {
    Self {
      client,
      pending: None,
      response: SearchResponse::default(),
      error: None,
    }
  }

  /// Start a search. Blank queries clear the results without a request.
  ///
  /// Results arrive through `poll()` or `settle()`. On failure the previous
  /// results stay and `error()` is set.
  pub fn search(&mut self, query: &str) {
    let query = query.trim();
    if query.is_empty() {
      self.clear();
      return;
    }

    let client = self.client.clone();
    let query = query.to_string();
    let mut pending = Query::new(move || {
      let client = client.clone();
      let query = query.clone();
      async move { client.semantic_search(&query).await }
    });
    pending.fetch();
    self.pending = Some(pending);
  }

  /// Apply a finished search, if any. Returns `true` on change.
  pub fn poll(&mut self) -> bool {
    let finished = match &mut self.pending {
      Some(pending) => pending.poll(),
      None => false,
    };
    if finished {
      self.apply_result();
    }
    finished
  }

  /// Wait for the in-flight search and apply it.
  pub async fn settle(&mut self) -> bool {
    let finished = match &mut self.pending {
      Some(pending) => pending.settle().await,
      None => false,
    };
    if finished {
      self.apply_result();
    }
    finished
  }

  fn apply_result(&mut self) {
    let Some(pending) = self.pending.take() else {
      return;
    };
    match pending.state() {
      QueryState::Success(response) => {
        self.response = response.clone();
        self.error = None;
      }
      QueryState::Error(error) => self.error = Some(error.clone()),
      QueryState::Idle | QueryState::Loading => {}
    }
  }

  /// Drop results, any error, and a search still in flight.
  pub fn clear(&mut self) {
    self.pending = None;
    self.response = SearchResponse::default();
    self.error = None;
  }

  pub fn response(&self) -> &SearchResponse {
    &self.response
  }

  pub fn results(&self) -> &[SearchResult] {
    &self.response.results
  }

  pub fn ai_answer(&self) -> Option<&str> {
    self.response.ai_answer.as_deref()
  }

  /// The server fell back to a degraded (non-semantic) search.
  pub fn is_fallback(&self) -> bool {
    self.response.fallback
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self
      .pending
      .as_ref()
      .is_some_and(|pending| pending.is_loading())
  }
}
