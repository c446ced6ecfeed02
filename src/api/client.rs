use reqwest::Method;
use serde_json::Value;

use super::api_types::{decode, ApiIdeaBody, ApiSearchRequest, ApiSearchResponse};
use super::dispatcher::{Dispatcher, UploadFile};
use super::types::{Idea, SearchResponse, UserStats};
use crate::error::ApiResult;

/// Typed wrapper around the dispatcher, one method per endpoint.
#[derive(Clone)]
pub struct IdeasClient {
  dispatcher: Dispatcher,
}

impl IdeasClient {
  pub fn new(dispatcher: Dispatcher) -> Self {
    Self { dispatcher }
  }

  pub fn dispatcher(&self) -> &Dispatcher {
    &self.dispatcher
  }

  /// List the user's ideas, newest first
  pub async fn list_ideas(&self) -> ApiResult<Vec<Idea>> {
    let value = self.dispatcher.request("/ideas", Method::GET, None).await?;
    decode(value)
  }

  pub async fn create_idea(&self, transcript: &str) -> ApiResult<Idea> {
    let body = to_value(ApiIdeaBody { transcript });
    let value = self
      .dispatcher
      .request("/ideas", Method::POST, Some(&body))
      .await?;
    decode(value)
  }

  /// Get a single idea. 404s and "not found" messages come back as `NotFound`.
  pub async fn get_idea(&self, id: &str) -> ApiResult<Idea> {
    let endpoint = format!("/ideas/{}", id);
    let value = self
      .dispatcher
      .request(&endpoint, Method::GET, None)
      .await
      .map_err(|e| e.into_not_found())?;
    decode(value)
  }

  pub async fn update_idea(&self, id: &str, transcript: &str) -> ApiResult<Idea> {
    let endpoint = format!("/ideas/{}", id);
    let body = to_value(ApiIdeaBody { transcript });
    let value = self
      .dispatcher
      .request(&endpoint, Method::PUT, Some(&body))
      .await?;
    decode(value)
  }

  pub async fn delete_idea(&self, id: &str) -> ApiResult<()> {
    let endpoint = format!("/ideas/{}", id);
    self
      .dispatcher
      .request(&endpoint, Method::DELETE, None)
      .await?;
    Ok(())
  }

  /// Upload a voice memo; the server transcribes it and returns the new idea.
  pub async fn create_idea_from_audio(&self, file: UploadFile) -> ApiResult<Idea> {
    let value = self
      .dispatcher
      .upload_file("/ideas/audio", file, "audio")
      .await?;
    decode(value)
  }

  /// Semantic search, normalized across both response schemas.
  pub async fn semantic_search(&self, query: &str) -> ApiResult<SearchResponse> {
    let body = to_value(ApiSearchRequest { query });
    let value = self
      .dispatcher
      .request("/search/semantic", Method::POST, Some(&body))
      .await?;
    let response: ApiSearchResponse = decode(value)?;
    Ok(response.into())
  }

  pub async fn user_stats(&self) -> ApiResult<UserStats> {
    let value = self
      .dispatcher
      .request("/user/stats", Method::GET, None)
      .await?;
    decode(value)
  }
}

/// Request bodies are plain structs of strings; serialization cannot fail.
fn to_value(body: impl serde::Serialize) -> Value {
  serde_json::to_value(body).unwrap_or(Value::Null)
}
