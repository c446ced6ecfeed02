//! Auth provider seam.
//!
//! The identity provider itself lives outside this crate. The core only needs
//! to read the current bearer token, ask for it to be revoked when the server
//! rejects it, and observe sign-in / sign-out transitions.

use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Session state as published by an auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
  SignedIn,
  SignedOut,
}

/// Source of bearer tokens for outgoing requests.
pub trait AuthProvider: Send + Sync {
  /// Current access token, if any. Absence means an anonymous request.
  fn access_token(&self) -> Option<String>;

  /// Drop the current token. Called when the server rejects it.
  fn invalidate_token(&self);

  /// Receiver that observes session transitions.
  fn session_changes(&self) -> watch::Receiver<SessionStatus>;
}

/// Auth provider backed by a token handed in at startup (or via `sign_in`).
pub struct StaticTokenProvider {
  token: RwLock<Option<String>>,
  status: watch::Sender<SessionStatus>,
}

impl StaticTokenProvider {
  pub fn new(token: Option<String>) -> Self {
    let initial = if token.is_some() {
      SessionStatus::SignedIn
    } else {
      SessionStatus::SignedOut
    };
    let (status, _) = watch::channel(initial);

    Self {
      token: RwLock::new(token),
      status,
    }
  }

  /// Build a provider from `IDEAS_API_TOKEN`, anonymous if unset.
  pub fn from_env() -> Self {
    let token = std::env::var("IDEAS_API_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty());
    if token.is_none() {
      debug!("IDEAS_API_TOKEN not set; requests will be anonymous");
    }
    Self::new(token)
  }

  pub fn sign_in(&self, token: impl Into<String>) {
    match self.token.write() {
      Ok(mut guard) => *guard = Some(token.into()),
      Err(e) => {
        warn!("auth token lock poisoned: {}", e);
        return;
      }
    }
    self.status.send_replace(SessionStatus::SignedIn);
  }

  pub fn sign_out(&self) {
    self.invalidate_token();
  }
}

impl AuthProvider for StaticTokenProvider {
  fn access_token(&self) -> Option<String> {
    self.token.read().ok().and_then(|t| t.clone())
  }

  fn invalidate_token(&self) {
    match self.token.write() {
      Ok(mut guard) => *guard = None,
      Err(e) => warn!("auth token lock poisoned: {}", e),
    }
    self.status.send_replace(SessionStatus::SignedOut);
  }

  fn session_changes(&self) -> watch::Receiver<SessionStatus> {
    self.status.subscribe()
  }
}
