//! Error taxonomy for calls to the Ideas service.

use thiserror::Error;

/// Message shown to the user when the server rejects the session token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";

/// Result type alias for dispatcher and controller operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Classified failure of a remote operation.
///
/// Transport failures and HTTP-level failures are kept apart only by the
/// `Network` / `Request` split; callers never need to inspect reqwest errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
  /// The backend URL is unset or still the placeholder. No I/O was performed.
  #[error("Backend is not configured: {0}")]
  Configuration(String),

  /// DNS, connect, TLS or timeout failure from the transport.
  #[error("Network error: {0}")]
  Network(String),

  /// 401 with an auth-shaped message. The token has already been invalidated.
  #[error("{}", SESSION_EXPIRED_MESSAGE)]
  SessionExpired,

  /// Any other non-2xx response, message surfaced verbatim.
  #[error("{message}")]
  Request {
    status: u16,
    message: String,
    code: Option<String>,
  },

  /// Single-item fetch for an id the server does not know.
  #[error("{0}")]
  NotFound(String),

  /// 2xx response whose body is not JSON or not the expected shape.
  #[error("Unexpected response from server: {0}")]
  InvalidResponse(String),
}

impl ApiError {
  /// HTTP status for errors that came from a response.
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Request { status, .. } => Some(*status),
      ApiError::SessionExpired => Some(401),
      ApiError::NotFound(_) => Some(404),
      _ => None,
    }
  }

  /// Whether the caller should send the user back through sign-in.
  pub fn requires_reauth(&self) -> bool {
    matches!(self, ApiError::SessionExpired)
  }

  /// Whether this error means the requested entity does not exist.
  ///
  /// A 404, or any error message mentioning "not found", qualifies.
  pub fn is_not_found(&self) -> bool {
    match self {
      ApiError::NotFound(_) => true,
      ApiError::Request {
        status, message, ..
      } => *status == 404 || message.to_lowercase().contains("not found"),
      _ => false,
    }
  }

  /// Convert a not-found shaped error into `NotFound`, leaving others alone.
  pub fn into_not_found(self) -> Self {
    if self.is_not_found() {
      match self {
        ApiError::Request { message, .. } => ApiError::NotFound(message),
        other => other,
      }
    } else {
      self
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    ApiError::Network(e.to_string())
  }
}
