//! The classic configuration API contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use monaco_core::api::Api;

use crate::error::Result;
use crate::types::RemoteObject;

/// Client for name-keyed classic configuration endpoints.
///
/// Implementations must be safe for concurrent use and must honor the
/// cancellation token at their next I/O boundary.
#[async_trait]
pub trait ClassicClient: Send + Sync {
    /// Lists all objects of the given API.
    async fn list(&self, cancel: &CancellationToken, api: &Api) -> Result<Vec<RemoteObject>>;

    /// Creates a new object (POST). Not retried by callers.
    async fn create(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        payload: &str,
    ) -> Result<RemoteObject>;

    /// Updates the object with the given id (PUT). Creates the object when
    /// the backend supports client-supplied ids.
    async fn update(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        id: &str,
        payload: &str,
    ) -> Result<RemoteObject>;

    /// Updates a single-configuration API at its fixed URL (PUT).
    async fn update_single(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        payload: &str,
    ) -> Result<RemoteObject>;

    /// Deletes the object with the given id.
    async fn delete(&self, cancel: &CancellationToken, api: &Api, id: &str) -> Result<()>;
}
