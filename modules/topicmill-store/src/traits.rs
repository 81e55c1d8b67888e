use async_trait::async_trait;

use topicmill_common::{ContentItem, NewContentItem, NewReply, Persona};

use crate::error::Result;

/// Persistence boundary for content items, replies, and the production queue.
///
/// The unique index on `fingerprint` is the true duplicate invariant;
/// `exists_by_fingerprint` exists so callers can skip generation cost for
/// known duplicates, not as a correctness guarantee.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool>;

    /// Persist a new item plus its pending production-queue row, atomically.
    /// Returns the new item id. A fingerprint collision surfaces as
    /// `StoreError::DuplicateFingerprint`.
    async fn create_item(&self, item: &NewContentItem) -> Result<i64>;

    /// The most recent `limit` items, newest first.
    async fn recent_items(&self, limit: u32) -> Result<Vec<ContentItem>>;

    async fn create_reply(&self, reply: &NewReply) -> Result<i64>;

    /// Record a completed production run against the item's pending queue row.
    async fn mark_production_completed(
        &self,
        item_id: i64,
        video_path: Option<&str>,
        thumbnail_path: Option<&str>,
    ) -> Result<()>;

    /// Record a failed production attempt against the item's pending queue row.
    async fn mark_production_failed(&self, item_id: i64, error: &str) -> Result<()>;
}

/// Read-only persona pool.
#[async_trait]
pub trait PersonaPool: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Persona>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Persona>>;
}
