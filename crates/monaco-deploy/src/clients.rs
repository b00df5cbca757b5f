//! The per-environment client set and its factory seam.

use std::sync::Arc;

use async_trait::async_trait;

use monaco_client::automation::AutomationClient;
use monaco_client::bucket::BucketClient;
use monaco_client::classic::ClassicClient;
use monaco_client::settings::SettingsClient;
use monaco_core::manifest::Environment;

/// All clients of one environment.
///
/// Automation and bucket clients exist only when the environment has OAuth
/// credentials; their absence makes the executor and the deletion planner
/// skip the corresponding families with a warning.
#[derive(Clone)]
pub struct ClientSet {
    /// Client for classic configuration APIs.
    pub classic: Arc<dyn ClassicClient>,
    /// Client for settings 2.0 objects.
    pub settings: Arc<dyn SettingsClient>,
    /// Client for automation resources, absent without OAuth.
    pub automation: Option<Arc<dyn AutomationClient>>,
    /// Client for Grail buckets, absent without OAuth.
    pub buckets: Option<Arc<dyn BucketClient>>,
}

impl std::fmt::Debug for ClientSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSet")
            .field("automation", &self.automation.is_some())
            .field("buckets", &self.buckets.is_some())
            .finish_non_exhaustive()
    }
}

/// Creates the client set of an environment at the start of a run.
///
/// Implementations own token acquisition and transport configuration; the
/// core only depends on this seam. Clients are created once per environment
/// per run and dropped when the run ends, releasing connection pools with
/// them.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Builds the clients for one environment.
    async fn create(&self, environment: &Environment) -> monaco_client::Result<ClientSet>;
}
