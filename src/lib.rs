//! Client-side data layer for the Ideas service.
//!
//! - [`api`]: request dispatcher and typed endpoint client
//! - [`cache`]: TTL-bounded persistent snapshot of the ideas collection
//! - [`sync`]: controllers UI code drives (collection, detail, search, stats)
//! - [`context`]: wiring and session lifecycle

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod query;
pub mod sync;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::AppContext;
pub use error::{ApiError, ApiResult};
