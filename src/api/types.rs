use serde::{Deserialize, Serialize};

/// A user-authored note: transcript text plus an optional audio reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
  pub id: String,
  #[serde(default)]
  pub user_id: String,
  #[serde(default)]
  pub transcript: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub audio_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<f64>,
  /// ISO-8601
  #[serde(default)]
  pub created_at: String,
  /// ISO-8601
  #[serde(default)]
  pub updated_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cluster_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub embedding: Option<Vec<f32>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggested_cluster_label: Option<String>,
}

/// One semantic search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
  pub idea: Idea,
  pub similarity: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub related_ideas: Option<Vec<Idea>>,
}

/// Search response normalized to the current schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
  pub results: Vec<SearchResult>,
  pub ai_answer: Option<String>,
  /// Set when the server degraded to a non-semantic search
  pub fallback: bool,
  pub relevant_notes_count: Option<u32>,
}

/// Usage statistics for the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
  #[serde(default)]
  pub total_ideas: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_clusters: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_duration: Option<f64>,
  /// Fields this client does not model yet
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}
