//! Shared fixtures for unit and integration tests.
//!
//! Compiled for `cargo test` and behind the `testing` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};
use tokio::sync::watch;

use crate::api::types::Idea;
use crate::auth::{AuthProvider, SessionStatus};

/// Auth provider that records how many times it was invalidated.
pub struct CountingAuth {
  token: Mutex<Option<String>>,
  invalidations: AtomicUsize,
  status: watch::Sender<SessionStatus>,
}

impl CountingAuth {
  pub fn new(token: Option<&str>) -> Self {
    let (status, _) = watch::channel(SessionStatus::SignedIn);
    Self {
      token: Mutex::new(token.map(String::from)),
      invalidations: AtomicUsize::new(0),
      status,
    }
  }

  pub fn invalidations(&self) -> usize {
    self.invalidations.load(Ordering::SeqCst)
  }
}

impl AuthProvider for CountingAuth {
  fn access_token(&self) -> Option<String> {
    self.token.lock().unwrap().clone()
  }

  fn invalidate_token(&self) {
    self.invalidations.fetch_add(1, Ordering::SeqCst);
    *self.token.lock().unwrap() = None;
    self.status.send_replace(SessionStatus::SignedOut);
  }

  fn session_changes(&self) -> watch::Receiver<SessionStatus> {
    self.status.subscribe()
  }
}

pub fn idea_json(id: &str, transcript: &str) -> Value {
  json!({
    "id": id,
    "userId": "user-1",
    "transcript": transcript,
    "createdAt": "2024-01-01T00:00:00Z",
    "updatedAt": "2024-01-01T00:00:00Z"
  })
}

pub fn idea(id: &str, transcript: &str) -> Idea {
  serde_json::from_value(idea_json(id, transcript)).unwrap()
}
