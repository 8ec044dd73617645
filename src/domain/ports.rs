use crate::domain::model::{ListingRecord, MatchResult, SeenSet};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Durable set of links that already triggered a notification.
pub trait SeenStore: Send + Sync {
    /// Returns the persisted set, or an empty set (and an empty store) on first run.
    fn load(&self) -> impl std::future::Future<Output = Result<SeenSet>> + Send;

    /// Replaces the persisted set with `seen`.
    fn save(&self, seen: &SeenSet) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Produces listing records for a search query, newest first.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<ListingRecord>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, found: &MatchResult) -> Result<()>;
}
