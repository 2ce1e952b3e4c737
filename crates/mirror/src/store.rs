//! Persistence trait for DM ↔ mirror correlations.

use {async_trait::async_trait, serde::Serialize};

use crate::Result;

/// One mirrored private message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationRecord {
    pub original_id: String,
    pub mirror_id: String,
    pub author_id: String,
    /// Last-known body. Audit trail only, never pushed back to the platform.
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Durable mapping from an inbound message id to its mirror.
///
/// Every operation touches a single key; implementations need no cross-key
/// coordination.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Insert a new correlation. Fails with [`crate::Error::DuplicateKey`]
    /// when `original_id` is already present.
    async fn put(
        &self,
        original_id: &str,
        mirror_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()>;

    async fn get_by_original_id(&self, original_id: &str) -> Result<Option<CorrelationRecord>>;

    async fn get_by_mirror_id(&self, mirror_id: &str) -> Result<Option<CorrelationRecord>>;

    /// Fails with [`crate::Error::NotFound`] when no record exists.
    async fn update_content(&self, original_id: &str, content: &str) -> Result<()>;

    /// Idempotent: deleting a missing key succeeds.
    async fn delete_by_original_id(&self, original_id: &str) -> Result<()>;

    /// Idempotent. Returns whether a record was removed.
    async fn delete_by_mirror_id(&self, mirror_id: &str) -> Result<bool>;

    /// Oldest records first.
    async fn list(&self, limit: usize) -> Result<Vec<CorrelationRecord>>;
}

pub(crate) fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
