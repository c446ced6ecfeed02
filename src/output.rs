//! Plain-text rendering for CLI output.

use chrono::{DateTime, Utc};

use ideas_client::api::{Idea, SearchResponse, UserStats};

const PREVIEW_LEN: usize = 72;

/// Truncate a string to a maximum length (in chars), adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Single-line preview of a transcript
fn preview(transcript: &str) -> String {
  let flat = transcript.split_whitespace().collect::<Vec<_>>().join(" ");
  truncate(&flat, PREVIEW_LEN)
}

pub fn print_ideas(label: &str, ideas: &[Idea]) {
  println!("# {} ({} ideas)", label, ideas.len());
  for idea in ideas {
    println!("{:<12} {:<25} {}", idea.id, idea.created_at, preview(&idea.transcript));
  }
}

pub fn print_idea(idea: &Idea) {
  println!("id:         {}", idea.id);
  println!("created:    {}", idea.created_at);
  println!("updated:    {}", idea.updated_at);
  if let Some(audio) = &idea.audio_url {
    println!("audio:      {}", audio);
  }
  if let Some(duration) = idea.duration {
    println!("duration:   {:.1}s", duration);
  }
  if let Some(label) = &idea.suggested_cluster_label {
    println!("cluster:    {}", label);
  }
  println!();
  println!("{}", idea.transcript);
}

pub fn print_search(response: &SearchResponse) {
  if response.fallback {
    print_warning("semantic search unavailable; showing keyword matches");
  }
  if let Some(answer) = &response.ai_answer {
    println!("{}", answer);
    println!();
  }
  if response.results.is_empty() {
    println!("no matches");
    return;
  }
  for result in &response.results {
    println!(
      "{:>5.2}  {:<12} {}",
      result.similarity,
      result.idea.id,
      preview(&result.idea.transcript)
    );
  }
  if let Some(count) = response.relevant_notes_count {
    println!("({} relevant notes)", count);
  }
}

pub fn print_stats(stats: &UserStats) {
  println!("ideas:      {}", stats.total_ideas);
  if let Some(clusters) = stats.total_clusters {
    println!("clusters:   {}", clusters);
  }
  if let Some(duration) = stats.total_duration {
    println!("recorded:   {:.0}s", duration);
  }
  for (key, value) in &stats.extra {
    println!("{:<11} {}", format!("{}:", key), value);
  }
}

pub fn print_cache_status(last_updated: Option<DateTime<Utc>>, valid_items: Option<usize>) {
  match (last_updated, valid_items) {
    (None, _) => println!("cache empty"),
    (Some(at), Some(count)) => println!("{} ideas cached at {} (fresh)", count, at.to_rfc3339()),
    (Some(at), None) => println!("snapshot from {} has expired", at.to_rfc3339()),
  }
}

pub fn print_warning(message: &str) {
  eprintln!("warning: {}", message);
}
