pub mod api_types;
mod cache;
pub mod client;
pub mod dispatcher;
pub mod types;

pub use client::IdeasClient;
pub use dispatcher::{Dispatcher, UploadFile};
pub use types::{Idea, SearchResponse, SearchResult, UserStats};
