//! Caching implementations for API types.

use crate::cache::Cacheable;

use super::types::Idea;

impl Cacheable for Idea {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn entity_type() -> &'static str {
    "ideas"
  }
}
