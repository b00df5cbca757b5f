//! In-memory fake tenants for testing.
//!
//! One fake per client contract, backed by `RwLock`-guarded maps. The fakes
//! implement the same upsert/identity semantics as a real tenant (classic
//! list-and-match by name, settings keyed on external id, automation keyed on
//! the supplied id, buckets keyed on name) so executor and deletion tests can
//! observe realistic behavior without a network.
//!
//! Not suitable for anything but tests: no persistence, single process only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use monaco_core::api::Api;
use monaco_core::config::AutomationResource;

use crate::automation::AutomationClient;
use crate::bucket::BucketClient;
use crate::classic::ClassicClient;
use crate::error::{Error, Result};
use crate::settings::SettingsClient;
use crate::types::{AutomationObject, BucketObject, RemoteObject, SettingsObject, SettingsUpsert};

/// One observed client call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Global sequence number, strictly increasing across all fakes sharing
    /// the log.
    pub sequence: u64,
    /// HTTP-verb-like method name (`GET`, `POST`, `PUT`, `DELETE`).
    pub method: String,
    /// The addressed API/type plus identity, e.g. `dashboard:Main board`.
    pub target: String,
    /// True for calls that would mutate the remote tenant.
    pub mutating: bool,
    /// The request payload, for mutating calls that carry one.
    pub payload: Option<String>,
}

/// A call log shared by all fakes of one test tenant.
///
/// The log establishes a single happens-before order across families, which
/// ordering assertions rely on.
#[derive(Debug, Default)]
pub struct CallLog {
    records: Mutex<Vec<CallRecord>>,
    sequence: AtomicU64,
}

impl CallLog {
    /// Creates a fresh shared log.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, method: &str, target: impl Into<String>, mutating: bool) {
        self.record_with_payload(method, target, mutating, None);
    }

    fn record_with_payload(
        &self,
        method: &str,
        target: impl Into<String>,
        mutating: bool,
        payload: Option<String>,
    ) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        // The log must keep working after a panicking test thread, so a
        // poisoned lock is recovered rather than surfaced.
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CallRecord {
                sequence,
                method: method.to_string(),
                target: target.into(),
                mutating,
                payload,
            });
    }

    /// Returns a snapshot of all records in call order.
    #[must_use]
    pub fn records(&self) -> Vec<CallRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns only the mutating records, in call order.
    #[must_use]
    pub fn mutating_records(&self) -> Vec<CallRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.mutating)
            .collect()
    }

    /// Sequence number of the first record whose target contains the needle.
    #[must_use]
    pub fn first_sequence_containing(&self, needle: &str) -> Option<u64> {
        self.records()
            .into_iter()
            .find(|record| record.target.contains(needle))
            .map(|record| record.sequence)
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Converts a lock poison error to a client error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::internal("fake tenant lock poisoned")
}

fn payload_name(payload: &str) -> Option<String> {
    serde_json::from_str::<Value>(payload)
        .ok()?
        .get("name")?
        .as_str()
        .map(ToString::to_string)
}

/// In-memory classic API tenant.
#[derive(Debug, Default)]
pub struct InMemoryClassicClient {
    objects: RwLock<HashMap<String, Vec<RemoteObject>>>,
    failures: RwLock<Vec<(String, u16)>>,
    counter: AtomicU64,
    log: Option<Arc<CallLog>>,
}

impl InMemoryClassicClient {
    /// Creates an empty fake tenant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake tenant sharing the given call log.
    #[must_use]
    pub fn with_log(log: Arc<CallLog>) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    /// Makes every mutating call whose payload contains `needle` fail with
    /// the given HTTP status.
    pub fn fail_when_payload_contains(&self, needle: impl Into<String>, status: u16) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((needle.into(), status));
    }

    /// Seeds an existing object, as if previously deployed.
    pub fn seed(&self, api_id: impl Into<String>, object: RemoteObject) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(api_id.into())
            .or_default()
            .push(object);
    }

    fn record(&self, method: &str, target: String, mutating: bool) {
        if let Some(log) = &self.log {
            log.record(method, target, mutating);
        }
    }

    fn record_payload(&self, method: &str, target: String, payload: &str) {
        if let Some(log) = &self.log {
            log.record_with_payload(method, target, true, Some(payload.to_string()));
        }
    }

    fn injected_failure(&self, payload: &str) -> Option<Error> {
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(needle, _)| payload.contains(needle))
            .map(|(_, status)| Error::remote(*status, "injected failure"))
    }

    fn next_id(&self, api: &Api) -> String {
        format!("{}-{}", api.id, self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ClassicClient for InMemoryClassicClient {
    async fn list(&self, cancel: &CancellationToken, api: &Api) -> Result<Vec<RemoteObject>> {
        check_cancelled(cancel)?;
        self.record("GET", api.id.clone(), false);
        Ok(self
            .objects
            .read()
            .map_err(poison_err)?
            .get(&api.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        payload: &str,
    ) -> Result<RemoteObject> {
        check_cancelled(cancel)?;
        let name = payload_name(payload).unwrap_or_default();
        self.record_payload("POST", format!("{}:{}", api.id, name), payload);
        if let Some(error) = self.injected_failure(payload) {
            return Err(error);
        }

        let object = RemoteObject {
            id: self.next_id(api),
            name: Some(name),
            properties: serde_json::Map::new(),
        };
        self.objects
            .write()
            .map_err(poison_err)?
            .entry(api.id.clone())
            .or_default()
            .push(object.clone());
        Ok(object)
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        id: &str,
        payload: &str,
    ) -> Result<RemoteObject> {
        check_cancelled(cancel)?;
        self.record_payload("PUT", format!("{}:{}", api.id, id), payload);
        if let Some(error) = self.injected_failure(payload) {
            return Err(error);
        }

        let name = payload_name(payload);
        let mut objects = self.objects.write().map_err(poison_err)?;
        let entries = objects.entry(api.id.clone()).or_default();
        if let Some(existing) = entries.iter_mut().find(|o| o.id == id) {
            if name.is_some() {
                existing.name = name;
            }
            return Ok(existing.clone());
        }
        // PUT with a client-supplied id creates the object.
        let object = RemoteObject {
            id: id.to_string(),
            name,
            properties: serde_json::Map::new(),
        };
        entries.push(object.clone());
        Ok(object)
    }

    async fn update_single(
        &self,
        cancel: &CancellationToken,
        api: &Api,
        payload: &str,
    ) -> Result<RemoteObject> {
        let id = api.id.clone();
        self.update(cancel, api, &id, payload).await
    }

    async fn delete(&self, cancel: &CancellationToken, api: &Api, id: &str) -> Result<()> {
        check_cancelled(cancel)?;
        self.record("DELETE", format!("{}:{}", api.id, id), true);
        let mut objects = self.objects.write().map_err(poison_err)?;
        let entries = objects.entry(api.id.clone()).or_default();
        let before = entries.len();
        entries.retain(|o| o.id != id);
        if entries.len() == before {
            return Err(Error::remote(404, format!("no {} with id {id}", api.id)));
        }
        Ok(())
    }
}

/// In-memory settings 2.0 tenant.
#[derive(Debug, Default)]
pub struct InMemorySettingsClient {
    objects: RwLock<Vec<(SettingsObject, Value)>>,
    counter: AtomicU64,
    log: Option<Arc<CallLog>>,
}

impl InMemorySettingsClient {
    /// Creates an empty fake tenant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake tenant sharing the given call log.
    #[must_use]
    pub fn with_log(log: Arc<CallLog>) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    fn record(&self, method: &str, target: String, mutating: bool) {
        if let Some(log) = &self.log {
            log.record(method, target, mutating);
        }
    }
}

#[async_trait]
impl SettingsClient for InMemorySettingsClient {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        upsert: SettingsUpsert,
    ) -> Result<SettingsObject> {
        check_cancelled(cancel)?;
        if let Some(log) = &self.log {
            log.record_with_payload(
                "PUT",
                format!("{}:{}", upsert.schema_id, upsert.external_id),
                true,
                serde_json::to_string(&upsert.value).ok(),
            );
        }

        let mut objects = self.objects.write().map_err(poison_err)?;
        if let Some((existing, payload)) = objects
            .iter_mut()
            .find(|(o, _)| o.external_id.as_deref() == Some(upsert.external_id.as_str()))
        {
            *payload = upsert.value;
            return Ok(existing.clone());
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let object = SettingsObject {
            object_id: format!("vu9U3hXa{n}"),
            external_id: Some(upsert.external_id),
            schema_id: upsert.schema_id.clone(),
            scope: upsert.scope,
            // Management zones migrated from a numeric-id classic API and
            // still expose that id.
            legacy_id: (upsert.schema_id == "builtin:management-zones")
                .then(|| format!("{}", 1_000_000 + n)),
        };
        objects.push((object.clone(), upsert.value));
        Ok(object)
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        schema_id: Option<&str>,
    ) -> Result<Vec<SettingsObject>> {
        check_cancelled(cancel)?;
        self.record("GET", schema_id.unwrap_or("*").to_string(), false);
        Ok(self
            .objects
            .read()
            .map_err(poison_err)?
            .iter()
            .filter(|(o, _)| schema_id.is_none_or(|schema| o.schema_id == schema))
            .map(|(o, _)| o.clone())
            .collect())
    }

    async fn delete(&self, cancel: &CancellationToken, object_id: &str) -> Result<()> {
        check_cancelled(cancel)?;
        self.record("DELETE", object_id.to_string(), true);
        let mut objects = self.objects.write().map_err(poison_err)?;
        let before = objects.len();
        objects.retain(|(o, _)| o.object_id != object_id);
        if objects.len() == before {
            return Err(Error::remote(404, format!("no object {object_id}")));
        }
        Ok(())
    }
}

/// In-memory automation tenant.
#[derive(Debug, Default)]
pub struct InMemoryAutomationClient {
    objects: RwLock<HashMap<(String, String), String>>,
    log: Option<Arc<CallLog>>,
}

impl InMemoryAutomationClient {
    /// Creates an empty fake tenant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake tenant sharing the given call log.
    #[must_use]
    pub fn with_log(log: Arc<CallLog>) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    fn record(&self, method: &str, target: String, mutating: bool) {
        if let Some(log) = &self.log {
            log.record(method, target, mutating);
        }
    }
}

#[async_trait]
impl AutomationClient for InMemoryAutomationClient {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
        id: &str,
        payload: &str,
    ) -> Result<AutomationObject> {
        check_cancelled(cancel)?;
        if let Some(log) = &self.log {
            log.record_with_payload(
                "PUT",
                format!("{}:{}", resource.type_id(), id),
                true,
                Some(payload.to_string()),
            );
        }
        self.objects
            .write()
            .map_err(poison_err)?
            .insert(
                (resource.type_id().to_string(), id.to_string()),
                payload.to_string(),
            );
        Ok(AutomationObject { id: id.to_string() })
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
    ) -> Result<Vec<AutomationObject>> {
        check_cancelled(cancel)?;
        self.record("GET", resource.type_id().to_string(), false);
        Ok(self
            .objects
            .read()
            .map_err(poison_err)?
            .keys()
            .filter(|(kind, _)| kind == resource.type_id())
            .map(|(_, id)| AutomationObject { id: id.clone() })
            .collect())
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        resource: AutomationResource,
        id: &str,
    ) -> Result<()> {
        check_cancelled(cancel)?;
        self.record("DELETE", format!("{}:{}", resource.type_id(), id), true);
        let removed = self
            .objects
            .write()
            .map_err(poison_err)?
            .remove(&(resource.type_id().to_string(), id.to_string()));
        if removed.is_none() {
            return Err(Error::remote(
                404,
                format!("no {} with id {id}", resource.type_id()),
            ));
        }
        Ok(())
    }
}

/// In-memory Grail bucket tenant.
#[derive(Debug, Default)]
pub struct InMemoryBucketClient {
    buckets: RwLock<HashMap<String, String>>,
    log: Option<Arc<CallLog>>,
}

impl InMemoryBucketClient {
    /// Creates an empty fake tenant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake tenant sharing the given call log.
    #[must_use]
    pub fn with_log(log: Arc<CallLog>) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    fn record(&self, method: &str, target: String, mutating: bool) {
        if let Some(log) = &self.log {
            log.record(method, target, mutating);
        }
    }
}

#[async_trait]
impl BucketClient for InMemoryBucketClient {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        name: &str,
        payload: &str,
    ) -> Result<BucketObject> {
        check_cancelled(cancel)?;
        if let Some(log) = &self.log {
            log.record_with_payload("PUT", format!("bucket:{name}"), true, Some(payload.to_string()));
        }
        self.buckets
            .write()
            .map_err(poison_err)?
            .insert(name.to_string(), payload.to_string());
        Ok(BucketObject {
            bucket_name: name.to_string(),
            status: Some("active".to_string()),
        })
    }

    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<BucketObject>> {
        check_cancelled(cancel)?;
        self.record("GET", "bucket".to_string(), false);
        Ok(self
            .buckets
            .read()
            .map_err(poison_err)?
            .keys()
            .map(|name| BucketObject {
                bucket_name: name.clone(),
                status: Some("active".to_string()),
            })
            .collect())
    }

    async fn delete(&self, cancel: &CancellationToken, name: &str) -> Result<()> {
        check_cancelled(cancel)?;
        self.record("DELETE", format!("bucket:{name}"), true);
        let removed = self
            .buckets
            .write()
            .map_err(poison_err)?
            .remove(name);
        if removed.is_none() {
            return Err(Error::remote(404, format!("no bucket {name}")));
        }
        Ok(())
    }
}
