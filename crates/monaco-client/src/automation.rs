//! The automation API contract. Requires OAuth.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use monaco_core::config::AutomationResource;

use crate::error::Result;
use crate::types::AutomationObject;

/// Client for id-keyed automation resources (workflows, business calendars,
/// scheduling rules).
#[async_trait]
pub trait AutomationClient: Send + Sync {
    /// Creates or updates the resource under the client-supplied id.
    /// Idempotent on that id.
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
        id: &str,
        payload: &str,
    ) -> Result<AutomationObject>;

    /// Lists all resources of the given kind.
    async fn list(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
    ) -> Result<Vec<AutomationObject>>;

    /// Deletes the resource with the given id.
    async fn delete(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
        id: &str,
    ) -> Result<()>;
}
