//! The settings 2.0 API contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{SettingsObject, SettingsUpsert};

/// Client for id-keyed settings 2.0 objects.
#[async_trait]
pub trait SettingsClient: Send + Sync {
    /// Creates or updates the object keyed on the upsert's external id and
    /// returns the canonical object the backend stored.
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        upsert: SettingsUpsert,
    ) -> Result<SettingsObject>;

    /// Lists objects, optionally restricted to one schema.
    async fn list(
        &self,
        cancel: &CancellationToken,
        schema_id: Option<&str>,
    ) -> Result<Vec<SettingsObject>>;

    /// Deletes the object with the given object id.
    async fn delete(&self, cancel: &CancellationToken, object_id: &str) -> Result<()>;
}
