//! # monaco-deploy
//!
//! The project graph compiler and deployment executor of the
//! configuration-as-code core.
//!
//! This crate implements the deploy domain, providing:
//!
//! - **Reference resolution**: typed dependency graphs from parameter
//!   references, one per environment
//! - **Deterministic ordering**: reproducible topological orders with
//!   coordinate-based tie-breaking
//! - **Bounded-parallel execution**: dependency-aware deployment with a
//!   worker pool per environment; a failure blocks only its descendants
//! - **Backend adapters**: one dispatcher per configuration family
//! - **Deletion**: the mirrored reverse operation with per-family identity
//!   rules
//!
//! ## Guarantees
//!
//! - For every edge `u -> v`, the upsert of `v` starts strictly after the
//!   upsert of `u` returned successfully
//! - A cyclic reference set is rejected at graph-build time, naming every
//!   cycle member
//! - A dry run resolves and renders everything but never mutates a tenant

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub(crate) mod dag;

mod adapters;
pub mod clients;
pub mod delete;
pub mod error;
pub mod executor;
pub mod graph;
pub mod render;
pub mod validate;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clients::{ClientFactory, ClientSet};
    pub use crate::delete::{DeleteEntries, DeletePointer};
    pub use crate::error::{Error, Result};
    pub use crate::executor::{DeployOptions, DeployOutcome, DeployReport};
    pub use crate::graph::DependencyGraph;
    pub use crate::{DeploySettings, DeploySummary, deploy, delete_all, delete_entries};
}

pub use clients::{ClientFactory, ClientSet};
pub use delete::{DeleteEntries, DeletePointer};
pub use error::{Error, Result};
pub use executor::{DeployEvent, DeployOptions, DeployOutcome, DeployReport, deploy_environment};
pub use graph::{DependencyGraph, project_closure};
pub use validate::UniqueNameValidator;

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::error as log_error;

use monaco_core::api::ApiCatalog;
use monaco_core::manifest::{Environment, Manifest};

/// What to deploy and how.
#[derive(Debug, Clone, Default)]
pub struct DeploySettings {
    /// Environments to deploy to; empty means all.
    pub environments: Vec<String>,
    /// Projects to deploy; empty means all.
    pub projects: Vec<String>,
    /// Resolve and render everything but never call a client.
    pub dry_run: bool,
}

/// The outcome of one deploy run across all selected environments.
#[derive(Debug, Default)]
pub struct DeploySummary {
    /// One report per environment, sorted by environment name.
    pub reports: Vec<DeployReport>,
}

impl DeploySummary {
    /// Iterates over every error of every environment.
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.reports.iter().flat_map(|report| report.errors.iter())
    }

    /// Total number of errors across environments.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Collapses the summary into a single aggregated result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aggregate`] carrying every per-environment error.
    pub fn into_result(self) -> Result<()> {
        let errors: Vec<Error> = self
            .reports
            .into_iter()
            .flat_map(|report| report.errors)
            .collect();
        Error::aggregate(errors)
    }
}

/// Deploys the manifest's configurations to the selected environments.
///
/// Environments execute concurrently and independently; a failing
/// environment never aborts its siblings. Every per-config and
/// per-environment error ends up in the summary.
pub async fn deploy(
    cancel: &CancellationToken,
    manifest: &Manifest,
    factory: Arc<dyn ClientFactory>,
    settings: DeploySettings,
) -> DeploySummary {
    let catalog = Arc::new(ApiCatalog::standard());
    let options = DeployOptions::from_env();
    let (environments, selection_errors) =
        select_environments(manifest, &settings.environments);

    let mut tasks: JoinSet<DeployReport> = JoinSet::new();
    for environment in environments {
        let report_base = DeployReport {
            environment: environment.name.clone(),
            ..DeployReport::default()
        };

        if let Err(source) = environment.validate() {
            let mut report = report_base;
            report.errors.push(Error::Core(source));
            tasks.spawn(async move { report });
            continue;
        }
        let configs = match project_closure(manifest, &settings.projects, &environment.name) {
            Ok(configs) => configs,
            Err(e) => {
                let mut report = report_base;
                report.errors.push(e);
                tasks.spawn(async move { report });
                continue;
            }
        };
        let validation_errors = UniqueNameValidator::validate_all(&catalog, &configs);
        if !validation_errors.is_empty() {
            let report = DeployReport {
                errors: validation_errors,
                ..report_base
            };
            tasks.spawn(async move { report });
            continue;
        }
        let graph = match DependencyGraph::build(&environment.name, configs) {
            Ok(graph) => graph,
            Err(e) => {
                let mut report = report_base;
                report.errors.push(e);
                tasks.spawn(async move { report });
                continue;
            }
        };

        let cancel = cancel.clone();
        let catalog = catalog.clone();
        let factory = factory.clone();
        let dry_run = settings.dry_run;
        tasks.spawn(async move {
            let clients = if dry_run {
                None
            } else {
                match factory.create(&environment).await {
                    Ok(clients) => Some(clients),
                    Err(source) => {
                        let mut report = DeployReport {
                            environment: environment.name.clone(),
                            ..DeployReport::default()
                        };
                        report.errors.push(Error::Auth {
                            environment: environment.name.clone(),
                            message: source.to_string(),
                        });
                        return report;
                    }
                }
            };
            executor::deploy_environment(&cancel, &environment, &catalog, &graph, clients, &options)
                .await
        });
    }

    let mut summary = DeploySummary::default();
    if !selection_errors.is_empty() {
        summary.reports.push(DeployReport {
            errors: selection_errors,
            ..DeployReport::default()
        });
    }
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => summary.reports.push(report),
            Err(e) => log_error!(error = %e, "environment deployment task panicked"),
        }
    }
    summary.reports.sort_by(|a, b| a.environment.cmp(&b.environment));
    summary
}

/// Deletes the pointed-at configurations from the selected environments.
///
/// # Errors
///
/// Returns [`Error::Aggregate`] when any environment reported errors.
pub async fn delete_entries(
    cancel: &CancellationToken,
    manifest: &Manifest,
    factory: Arc<dyn ClientFactory>,
    entries: &DeleteEntries,
    selected_environments: &[String],
) -> Result<()> {
    let catalog = ApiCatalog::standard();
    let (environments, mut errors) = select_environments(manifest, selected_environments);

    for environment in environments {
        let clients = match factory.create(&environment).await {
            Ok(clients) => clients,
            Err(source) => {
                errors.push(Error::Auth {
                    environment: environment.name.clone(),
                    message: source.to_string(),
                });
                continue;
            }
        };
        if let Err(e) =
            delete::delete_configs(cancel, &environment.name, &clients, &catalog, entries).await
        {
            errors.push(e);
        }
    }
    Error::aggregate(errors)
}

/// Deletes every known configuration object from the selected environments.
///
/// Intended for test cleanup; never invoked implicitly by deploy.
///
/// # Errors
///
/// Returns [`Error::Aggregate`] when any environment reported errors.
pub async fn delete_all(
    cancel: &CancellationToken,
    manifest: &Manifest,
    factory: Arc<dyn ClientFactory>,
    selected_environments: &[String],
) -> Result<()> {
    let catalog = ApiCatalog::standard();
    let (environments, mut errors) = select_environments(manifest, selected_environments);

    for environment in environments {
        let clients = match factory.create(&environment).await {
            Ok(clients) => clients,
            Err(source) => {
                errors.push(Error::Auth {
                    environment: environment.name.clone(),
                    message: source.to_string(),
                });
                continue;
            }
        };
        if let Err(e) = delete::delete_all(cancel, &clients, &catalog).await {
            errors.push(e);
        }
    }
    Error::aggregate(errors)
}

/// Picks the selected environments out of the manifest; empty selection
/// means all. Unknown names become load errors.
fn select_environments(
    manifest: &Manifest,
    selected: &[String],
) -> (Vec<Environment>, Vec<Error>) {
    if selected.is_empty() {
        return (manifest.environments.values().cloned().collect(), Vec::new());
    }
    let mut environments = Vec::new();
    let mut errors = Vec::new();
    for name in selected {
        match manifest.environments.get(name) {
            Some(environment) => environments.push(environment.clone()),
            None => errors.push(Error::load(format!("environment '{name}' is not defined"))),
        }
    }
    (environments, errors)
}
