//! Controllers that keep UI-facing state in step with the Ideas service.

pub mod collection;
pub mod detail;
pub mod search;
pub mod stats;

pub use collection::{CollectionController, SyncStatus};
pub use detail::{Entity, IdeaDetail};
pub use search::SearchController;
pub use stats::StatsController;
