//! Per-tenant request concurrency limiting.
//!
//! Outgoing HTTP concurrency to each tenant is bounded by a semaphore
//! decorator around the client, orthogonal to the executor's worker count.
//! The limit defaults to 5 and is overridable via
//! `MONACO_CONCURRENT_REQUESTS`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;

use monaco_core::api::Api;
use monaco_core::config::AutomationResource;

use crate::automation::AutomationClient;
use crate::bucket::BucketClient;
use crate::classic::ClassicClient;
use crate::error::Result;
use crate::settings::SettingsClient;
use crate::types::{AutomationObject, BucketObject, RemoteObject, SettingsObject, SettingsUpsert};

/// Environment variable overriding the per-tenant request limit.
pub const CONCURRENT_REQUESTS_ENV: &str = "MONACO_CONCURRENT_REQUESTS";

/// Default number of parallel requests per tenant.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

/// Reads the per-tenant request limit from the environment.
///
/// Non-numeric or non-positive values fall back to the default.
#[must_use]
pub fn concurrent_request_limit() -> usize {
    std::env::var(CONCURRENT_REQUESTS_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_CONCURRENT_REQUESTS)
}

/// A shared semaphore bounding parallel requests against one tenant.
///
/// Cloning shares the underlying permit pool, so all clients of one
/// environment can be decorated with clones of the same limiter.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    semaphore: Arc<Semaphore>,
}

impl RequestLimiter {
    /// Creates a limiter with the given number of permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    /// Creates a limiter sized from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(concurrent_request_limit())
    }

    /// Acquires a permit, waiting while the tenant is at its limit.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .expect("limiter semaphore is never closed")
    }
}

/// Decorator bounding the parallel requests of the wrapped client.
#[derive(Debug, Clone)]
pub struct RateLimited<C> {
    inner: C,
    limiter: RequestLimiter,
}

impl<C> RateLimited<C> {
    /// Wraps a client with the given limiter.
    pub fn new(inner: C, limiter: RequestLimiter) -> Self {
        Self { inner, limiter }
    }

    /// Returns the wrapped client.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<C: ClassicClient> ClassicClient for RateLimited<C> {
    async fn list(&self, cancel: &CancellationToken, api: &Api) -> Result<Vec<RemoteObject>> {
        let _permit = self.limiter.acquire().await;
        self.inner.list(cancel, api).await
    }

    async fn create(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        payload: &str,
    ) -> Result<RemoteObject> {
        let _permit = self.limiter.acquire().await;
        self.inner.create(cancel, api, payload).await
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        id: &str,
        payload: &str,
    ) -> Result<RemoteObject> {
        let _permit = self.limiter.acquire().await;
        self.inner.update(cancel, api, id, payload).await
    }

    async fn update_single(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        payload: &str,
    ) -> Result<RemoteObject> {
        let _permit = self.limiter.acquire().await;
        self.inner.update_single(cancel, api, payload).await
    }

    async fn delete(&self, cancel: &CancellationToken, api: &Api, id: &str) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.delete(cancel, api, id).await
    }
}

#[async_trait]
impl<C: SettingsClient> SettingsClient for RateLimited<C> {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        upsert: SettingsUpsert,
    ) -> Result<SettingsObject> {
        let _permit = self.limiter.acquire().await;
        self.inner.upsert(cancel, upsert).await
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        schema_id: Option<&str>,
    ) -> Result<Vec<SettingsObject>> {
        let _permit = self.limiter.acquire().await;
        self.inner.list(cancel, schema_id).await
    }

    async fn delete(&self, cancel: &CancellationToken, object_id: &str) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.delete(cancel, object_id).await
    }
}

#[async_trait]
impl<C: AutomationClient> AutomationClient for RateLimited<C> {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
        id: &str,
        payload: &str,
    ) -> Result<AutomationObject> {
        let _permit = self.limiter.acquire().await;
        self.inner.upsert(cancel, resource, id, payload).await
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
    ) -> Result<Vec<AutomationObject>> {
        let _permit = self.limiter.acquire().await;
        self.inner.list(cancel, resource).await
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
        id: &str,
    ) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.delete(cancel, resource, id).await
    }
}

#[async_trait]
impl<C: BucketClient> BucketClient for RateLimited<C> {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        name: &str,
        payload: &str,
    ) -> Result<BucketObject> {
        let _permit = self.limiter.acquire().await;
        self.inner.upsert(cancel, name, payload).await
    }

    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<BucketObject>> {
        let _permit = self.limiter.acquire().await;
        self.inner.list(cancel).await
    }

    async fn delete(&self, cancel: &CancellationToken, name: &str) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.delete(cancel, name).await
    }
}
