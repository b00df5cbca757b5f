//! Shared fixtures for deploy and delete integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use monaco_client::memory::{
    CallLog, InMemoryAutomationClient, InMemoryBucketClient, InMemoryClassicClient,
    InMemorySettingsClient,
};
use monaco_core::config::{Config, ConfigType};
use monaco_core::coordinate::Coordinate;
use monaco_core::manifest::{Auth, Environment, Manifest, OAuthCredentials, Project};
use monaco_core::observability::Redacted;
use monaco_core::parameter::Parameter;
use monaco_deploy::{ClientFactory, ClientSet};

/// One fake tenant: all four family fakes sharing a single call log.
pub struct FakeTenant {
    pub log: Arc<CallLog>,
    pub classic: Arc<InMemoryClassicClient>,
    pub settings: Arc<InMemorySettingsClient>,
    pub automation: Arc<InMemoryAutomationClient>,
    pub buckets: Arc<InMemoryBucketClient>,
}

impl FakeTenant {
    pub fn new() -> Self {
        let log = CallLog::new();
        Self {
            classic: Arc::new(InMemoryClassicClient::with_log(log.clone())),
            settings: Arc::new(InMemorySettingsClient::with_log(log.clone())),
            automation: Arc::new(InMemoryAutomationClient::with_log(log.clone())),
            buckets: Arc::new(InMemoryBucketClient::with_log(log.clone())),
            log,
        }
    }

    /// A full client set, as created for an OAuth-capable environment.
    pub fn client_set(&self) -> ClientSet {
        ClientSet {
            classic: self.classic.clone(),
            settings: self.settings.clone(),
            automation: Some(self.automation.clone()),
            buckets: Some(self.buckets.clone()),
        }
    }

    /// A client set without the OAuth-only clients.
    pub fn client_set_without_oauth(&self) -> ClientSet {
        ClientSet {
            classic: self.classic.clone(),
            settings: self.settings.clone(),
            automation: None,
            buckets: None,
        }
    }
}

/// Factory handing out clones of one prepared client set.
pub struct FixedFactory {
    pub clients: ClientSet,
}

#[async_trait]
impl ClientFactory for FixedFactory {
    async fn create(&self, _environment: &Environment) -> monaco_client::Result<ClientSet> {
        Ok(self.clients.clone())
    }
}

/// Factory that must never be called; used to prove dry runs stay offline.
pub struct PanickingFactory;

#[async_trait]
impl ClientFactory for PanickingFactory {
    async fn create(&self, environment: &Environment) -> monaco_client::Result<ClientSet> {
        panic!(
            "client factory must not be called for environment '{}'",
            environment.name
        );
    }
}

pub fn token_environment(name: &str) -> Environment {
    Environment {
        name: name.into(),
        group: "default".into(),
        url: format!("https://{name}.example.com"),
        auth: Auth {
            token: Some(Redacted::new("dt0c01.token")),
            oauth: None,
        },
    }
}

pub fn oauth_environment(name: &str) -> Environment {
    Environment {
        name: name.into(),
        group: "default".into(),
        url: format!("https://{name}.example.com"),
        auth: Auth {
            token: Some(Redacted::new("dt0c01.token")),
            oauth: Some(OAuthCredentials {
                client_id: "dt0s02.client".into(),
                client_secret: Redacted::new("secret"),
                token_endpoint: None,
            }),
        },
    }
}

/// A classic configuration with a static name and a minimal JSON template.
pub fn classic_config(project: &str, api: &str, id: &str, name: &str, environment: &str) -> Config {
    let mut parameters = BTreeMap::new();
    parameters.insert("name".to_string(), Parameter::value(name));
    Config {
        coordinate: Coordinate::new(project, api, id),
        config_type: ConfigType::ClassicApi { api: api.into() },
        parameters,
        template: r#"{"name": "{{ .name }}"}"#.into(),
        environment: environment.into(),
        group: "default".into(),
        skip: false,
        original_file: None,
    }
}

pub fn manifest_with(environments: Vec<Environment>, projects: Vec<Project>) -> Manifest {
    Manifest {
        environments: environments
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect(),
        projects,
    }
}

pub fn single_project(id: &str, configs: Vec<Config>) -> Vec<Project> {
    vec![Project {
        id: id.into(),
        configs,
    }]
}
