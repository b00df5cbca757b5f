//! Manifest records supplied by the external loader.
//!
//! The loader (outside this workspace) parses manifest and configuration
//! files and hands the core a [`Manifest`]: environment records with their
//! credentials and a list of projects, each carrying loaded configurations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::observability::Redacted;

/// Credentials of an environment. At least one kind must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Auth {
    /// Classic API access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Redacted>,
    /// Platform OAuth credentials, required for automation and bucket types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthCredentials>,
}

/// OAuth client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: Redacted,
    /// Token endpoint override; the default endpoint is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
}

/// A deployment target reachable under a single base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Unique environment name.
    pub name: String,
    /// Group the environment belongs to.
    pub group: String,
    /// Base URL of the tenant.
    pub url: String,
    /// Credentials for this environment.
    pub auth: Auth,
}

impl Environment {
    /// True if OAuth credentials are configured.
    #[must_use]
    pub const fn has_oauth(&self) -> bool {
        self.auth.oauth.is_some()
    }

    /// Checks the environment invariant: at least one auth kind present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnvironment`] if neither a token nor OAuth
    /// credentials are configured.
    pub fn validate(&self) -> Result<()> {
        if self.auth.token.is_none() && self.auth.oauth.is_none() {
            return Err(Error::InvalidEnvironment {
                environment: self.name.clone(),
                message: "no credentials configured (token or oauth required)".to_string(),
            });
        }
        Ok(())
    }
}

/// A project: a named list of loaded configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project id, the first component of every contained coordinate.
    pub id: String,
    /// Configurations of this project, across all environments.
    pub configs: Vec<Config>,
}

impl Project {
    /// Returns the configurations targeting the given environment.
    #[must_use]
    pub fn configs_for_environment(&self, environment: &str) -> Vec<&Config> {
        self.configs
            .iter()
            .filter(|c| c.environment == environment)
            .collect()
    }
}

/// Everything the loader yields for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Environments by name.
    pub environments: BTreeMap<String, Environment>,
    /// All loaded projects.
    pub projects: Vec<Project>,
}

impl Manifest {
    /// Looks up a project by id.
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}
