//! The Grail bucket API contract. Requires OAuth.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::BucketObject;

/// Client for name-keyed Grail storage buckets.
#[async_trait]
pub trait BucketClient: Send + Sync {
    /// Creates the bucket or updates it when one with the name exists.
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        name: &str,
        payload: &str,
    ) -> Result<BucketObject>;

    /// Lists all buckets of the tenant.
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<BucketObject>>;

    /// Deletes the bucket with the given name.
    async fn delete(&self, cancel: &CancellationToken, name: &str) -> Result<()>;
}
