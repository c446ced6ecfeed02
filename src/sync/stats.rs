//! User statistics façade. Always live, never cached.

use crate::api::{IdeasClient, UserStats};
use crate::error::ApiError;
use crate::query::Query;

pub struct StatsController {
  query: Query<UserStats>,
}

impl StatsController {
  pub fn new(client: IdeasClient) -> Self {
    let query = Query::new(move || {
      let client = client.clone();
      async move { client.user_stats().await }
    });

    Self { query }
  }

  pub fn refetch(&mut self) {
    self.query.refetch();
  }

  pub fn poll(&mut self) -> bool {
    self.query.poll()
  }

  pub async fn settle(&mut self) -> bool {
    self.query.settle().await
  }

  pub fn stats(&self) -> Option<&UserStats> {
    self.query.data()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.query.error()
  }

  pub fn is_loading(&self) -> bool {
    self.query.is_loading()
  }
}
