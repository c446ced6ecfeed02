//! Serde types matching the Ideas service wire format.
//!
//! These stay separate from the domain types so schema drift on the server is
//! absorbed here, once, instead of leaking into controllers.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::types::{SearchResponse, SearchResult};
use crate::error::{ApiError, ApiResult};

/// Decode a dispatcher JSON value into a typed response.
pub fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
  serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub message: String,
  pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiIdeaBody<'a> {
  pub transcript: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApiSearchRequest<'a> {
  pub query: &'a str,
}

// ============================================================================
// Search response - two schema versions in the wild
// ============================================================================

/// Either the legacy bare array or the current wrapped object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiSearchResponse {
  Legacy(Vec<SearchResult>),
  Current(ApiSearchEnvelope),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchEnvelope {
  #[serde(default)]
  pub results: Vec<SearchResult>,
  pub ai_answer: Option<String>,
  #[serde(default)]
  pub fallback: bool,
  pub relevant_notes_count: Option<u32>,
}

impl From<ApiSearchResponse> for SearchResponse {
  fn from(response: ApiSearchResponse) -> Self {
    match response {
      ApiSearchResponse::Legacy(results) => SearchResponse {
        results,
        ai_answer: None,
        fallback: false,
        relevant_notes_count: None,
      },
      ApiSearchResponse::Current(envelope) => SearchResponse {
        results: envelope.results,
        ai_answer: envelope.ai_answer,
        fallback: envelope.fallback,
        relevant_notes_count: envelope.relevant_notes_count,
      },
    }
  }
}
