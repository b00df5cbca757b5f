//! The deployment executor.
//!
//! Walks a per-environment dependency graph in dependency order and applies
//! every configuration through the matching backend adapter. Independent
//! configurations deploy in parallel on a bounded worker pool; a failed
//! configuration blocks only its transitive descendants. The resolved-entity
//! table has a single writer (the completion handler) and is snapshotted by
//! workers for parameter resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, warn};

use monaco_core::api::ApiCatalog;
use monaco_core::config::{Config, ConfigType};
use monaco_core::coordinate::Coordinate;
use monaco_core::entity::{EntityMap, ResolvedEntity};
use monaco_core::featureflags;
use monaco_core::manifest::Environment;
use monaco_core::observability::deploy_span;
use monaco_core::parameter::{self, NAME_PARAMETER, ProcessEnv, ResolveContext};

use crate::adapters::{self, AdapterContext};
use crate::clients::ClientSet;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::render;

/// Environment variable overriding the per-environment worker count.
pub const CONCURRENT_DEPLOYMENTS_ENV: &str = "MONACO_CONCURRENT_DEPLOYMENTS";

/// Default number of deployment workers per environment.
pub const DEFAULT_CONCURRENT_DEPLOYMENTS: usize = 8;

/// Executor tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct DeployOptions {
    /// Worker-pool size per environment.
    pub workers: usize,
}

impl DeployOptions {
    /// Reads the worker count from the environment, clamped to at least 1.
    #[must_use]
    pub fn from_env() -> Self {
        let workers = std::env::var(CONCURRENT_DEPLOYMENTS_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|workers| *workers > 0)
            .unwrap_or(DEFAULT_CONCURRENT_DEPLOYMENTS);
        Self { workers }
    }
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_CONCURRENT_DEPLOYMENTS,
        }
    }
}

/// How one configuration ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Upserted against the environment (or resolved in a dry run).
    Deployed,
    /// Intentionally not deployed; a skip entity was recorded.
    Skipped,
    /// The deployment of this configuration failed.
    Failed,
    /// Never dispatched because a dependency failed.
    Blocked,
}

/// One configuration's execution record.
#[derive(Debug, Clone)]
pub struct DeployEvent {
    /// The configuration.
    pub coordinate: Coordinate,
    /// When the per-config procedure started.
    pub started_at: DateTime<Utc>,
    /// When the outcome was recorded.
    pub finished_at: DateTime<Utc>,
    /// The outcome.
    pub outcome: DeployOutcome,
}

/// The result of deploying one environment.
#[derive(Debug, Default)]
pub struct DeployReport {
    /// Name of the environment.
    pub environment: String,
    /// All resolved entities, including skip entities.
    pub entities: EntityMap,
    /// Every error, including one [`Error::DescendantBlocked`] per vertex
    /// that was never dispatched.
    pub errors: Vec<Error>,
    /// Execution records in completion order.
    pub events: Vec<DeployEvent>,
}

impl DeployReport {
    /// True if any configuration failed or was blocked.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The execution record of a coordinate, if it ran.
    #[must_use]
    pub fn event(&self, coordinate: &Coordinate) -> Option<&DeployEvent> {
        self.events.iter().find(|e| e.coordinate == *coordinate)
    }
}

/// Deploys all configurations of one environment's graph.
///
/// `clients` is `None` for a dry run: full parameter resolution and template
/// rendering happen, entities are fabricated with placeholder ids, and no
/// client call is made.
///
/// Partial success is expected; per-config errors land in the report and do
/// not abort the environment.
pub async fn deploy_environment(
    cancel: &CancellationToken,
    environment: &Environment,
    catalog: &ApiCatalog,
    graph: &DependencyGraph,
    clients: Option<ClientSet>,
    options: &DeployOptions,
) -> DeployReport {
    let mut report = DeployReport {
        environment: environment.name.clone(),
        ..DeployReport::default()
    };
    let table = Arc::new(RwLock::new(EntityMap::new()));
    let environment = Arc::new(environment.clone());
    let catalog = Arc::new(catalog.clone());

    let parallel = featureflags::GRAPH_DEPLOY.enabled()
        && featureflags::GRAPH_DEPLOY_PARALLEL.enabled()
        && options.workers > 1;
    let mut scheduler = Scheduler {
        cancel,
        environment: &environment,
        catalog: &catalog,
        graph,
        clients,
        table: &table,
        report: &mut report,
        blocked: BTreeSet::new(),
    };
    if parallel {
        scheduler.run_parallel(options.workers).await;
    } else {
        scheduler.run_sequential().await;
    }

    match table.read() {
        Ok(entities) => report.entities = entities.clone(),
        Err(_) => report
            .errors
            .push(Error::internal("resolved entity table lock poisoned")),
    }
    info!(
        environment = report.environment.as_str(),
        deployed = report
            .events
            .iter()
            .filter(|e| e.outcome == DeployOutcome::Deployed)
            .count(),
        errors = report.errors.len(),
        "environment deployment finished"
    );
    report
}

struct Scheduler<'a> {
    cancel: &'a CancellationToken,
    environment: &'a Arc<Environment>,
    catalog: &'a Arc<ApiCatalog>,
    graph: &'a DependencyGraph,
    clients: Option<ClientSet>,
    table: &'a Arc<RwLock<EntityMap>>,
    report: &'a mut DeployReport,
    blocked: BTreeSet<Coordinate>,
}

impl Scheduler<'_> {
    /// Kahn-driven bounded worker pool over the graph.
    async fn run_parallel(&mut self, workers: usize) {
        let mut in_degree = self.graph.in_degrees();
        let mut ready: BTreeSet<Coordinate> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(coordinate, _)| coordinate.clone())
            .collect();
        let mut in_flight = 0_usize;

        type Completion = (Coordinate, DateTime<Utc>, Result<ResolvedEntity>);
        let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

        loop {
            // Cancellation stops new dispatch; in-flight calls observe the
            // same token and abort at their next I/O boundary.
            if !self.cancel.is_cancelled() {
                while in_flight < workers {
                    let Some(coordinate) = ready.pop_first() else {
                        break;
                    };
                    let config = self
                        .graph
                        .config(&coordinate)
                        .expect("ready vertices are graph nodes")
                        .clone();
                    let span =
                        deploy_span(&self.environment.name, &self.environment.group, &coordinate);
                    let task = deploy_config(
                        self.cancel.clone(),
                        self.environment.clone(),
                        self.catalog.clone(),
                        self.clients.clone(),
                        config,
                        self.table.clone(),
                    );
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let started_at = Utc::now();
                        let result = task.instrument(span).await;
                        let _ = tx.send((coordinate, started_at, result));
                    });
                    in_flight += 1;
                }
            }

            if in_flight == 0 {
                break;
            }
            let Some((coordinate, started_at, result)) = rx.recv().await else {
                break;
            };
            in_flight -= 1;

            if self.complete(&coordinate, started_at, result) {
                for successor in self.graph.successors(&coordinate) {
                    if self.blocked.contains(&successor) {
                        continue;
                    }
                    let degree = in_degree
                        .get_mut(&successor)
                        .expect("successors are graph nodes");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(successor);
                    }
                }
            }
        }
    }

    /// Deploys along the deterministic linear order, one at a time.
    async fn run_sequential(&mut self) {
        for coordinate in self.graph.topological_order().to_vec() {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.blocked.contains(&coordinate) {
                continue;
            }
            let config = self
                .graph
                .config(&coordinate)
                .expect("ordered vertices are graph nodes")
                .clone();
            let span = deploy_span(&self.environment.name, &self.environment.group, &coordinate);
            let started_at = Utc::now();
            let result = deploy_config(
                self.cancel.clone(),
                self.environment.clone(),
                self.catalog.clone(),
                self.clients.clone(),
                config,
                self.table.clone(),
            )
            .instrument(span)
            .await;
            self.complete(&coordinate, started_at, result);
        }
    }

    /// Records one completion: inserts the entity or blocks all transitive
    /// descendants of a failed vertex. Returns true on success.
    fn complete(
        &mut self,
        coordinate: &Coordinate,
        started_at: DateTime<Utc>,
        result: Result<ResolvedEntity>,
    ) -> bool {
        let finished_at = Utc::now();
        match result {
            Ok(entity) => {
                let outcome = if entity.skip {
                    DeployOutcome::Skipped
                } else {
                    DeployOutcome::Deployed
                };
                match self.table.write() {
                    Ok(mut table) => {
                        table.insert(coordinate.clone(), entity);
                    }
                    Err(_) => {
                        // Without the entity the dependents cannot resolve;
                        // treat the vertex as failed.
                        return self.complete(
                            coordinate,
                            started_at,
                            Err(Error::internal("resolved entity table lock poisoned")),
                        );
                    }
                }
                self.report.events.push(DeployEvent {
                    coordinate: coordinate.clone(),
                    started_at,
                    finished_at,
                    outcome,
                });
                true
            }
            Err(error) => {
                warn!(
                    environment = self.environment.name.as_str(),
                    group = self.environment.group.as_str(),
                    coordinate = %coordinate,
                    config_type = coordinate.config_type.as_str(),
                    error = %error,
                    "configuration deployment failed"
                );
                self.report.errors.push(error);
                self.report.events.push(DeployEvent {
                    coordinate: coordinate.clone(),
                    started_at,
                    finished_at,
                    outcome: DeployOutcome::Failed,
                });
                for descendant in self.graph.descendants(coordinate) {
                    if self.blocked.insert(descendant.clone()) {
                        self.report.errors.push(Error::DescendantBlocked {
                            coordinate: descendant.clone(),
                            failed: coordinate.clone(),
                        });
                        self.report.events.push(DeployEvent {
                            coordinate: descendant,
                            started_at: finished_at,
                            finished_at,
                            outcome: DeployOutcome::Blocked,
                        });
                    }
                }
                false
            }
        }
    }
}

/// The per-vertex procedure: skip handling, parameter resolution, template
/// rendering, adapter dispatch.
async fn deploy_config(
    cancel: CancellationToken,
    environment: Arc<Environment>,
    catalog: Arc<ApiCatalog>,
    clients: Option<ClientSet>,
    config: Config,
    table: Arc<RwLock<EntityMap>>,
) -> Result<ResolvedEntity> {
    let coordinate = config.coordinate.clone();

    if config.skip {
        info!(coordinate = %coordinate, "configuration is marked skip, not deploying");
        return Ok(ResolvedEntity::skipped(coordinate));
    }
    if let Some(entity) = oauth_gate(&environment, &clients, &config) {
        return Ok(entity);
    }

    // Intra-config parameter order; later parameters see earlier values.
    let order = parameter::resolution_order(&coordinate, &config.parameters)?;
    let snapshot = table
        .read()
        .map_err(|_| Error::internal("resolved entity table lock poisoned"))?
        .clone();
    let mut properties: BTreeMap<String, Value> = BTreeMap::new();
    for (name, param) in order {
        let ctx = ResolveContext {
            coordinate: &coordinate,
            entities: &snapshot,
            properties: &properties,
            env: &ProcessEnv,
        };
        match param.resolve(&ctx) {
            Ok(value) => {
                properties.insert(name.to_string(), value);
            }
            Err(monaco_core::Error::UnresolvedReference { target, .. })
                if snapshot.get(&target).is_some_and(|entity| entity.skip) =>
            {
                return Err(Error::ConfigSkipped {
                    coordinate,
                    dependency: target,
                });
            }
            Err(source) => {
                return Err(Error::Parameter {
                    coordinate,
                    parameter: name.to_string(),
                    source,
                });
            }
        }
    }

    let name = match properties.get(NAME_PARAMETER) {
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) if config.config_type.is_classic() => {
            return Err(Error::Core(monaco_core::Error::InvalidParameterValue {
                coordinate,
                parameter: NAME_PARAMETER.to_string(),
                message: "must resolve to a string for classic APIs".to_string(),
            }));
        }
        _ => None,
    };

    let payload = render::render_config(&coordinate, &config.template, &properties)?;

    match &clients {
        None => {
            // Dry run: fabricate a placeholder id so downstream references
            // resolve, without touching the environment.
            let id = format!("{}/{}", config.config_type.type_id(), coordinate.config_id);
            let entity_name = name.unwrap_or_else(|| coordinate.config_id.clone());
            Ok(ResolvedEntity::deployed(
                coordinate,
                entity_name,
                properties,
                id,
            ))
        }
        Some(clients) => {
            let ctx = AdapterContext {
                cancel: &cancel,
                environment: &environment,
                catalog: &catalog,
                clients,
            };
            adapters::upsert(ctx, &config, name.as_deref(), &payload, &properties).await
        }
    }
}

/// Skips OAuth-only families with a warning when the environment cannot
/// deploy them; never an error.
fn oauth_gate(
    environment: &Environment,
    clients: &Option<ClientSet>,
    config: &Config,
) -> Option<ResolvedEntity> {
    let coordinate = &config.coordinate;

    if matches!(config.config_type, ConfigType::Bucket) && !featureflags::BUCKETS.enabled() {
        warn!(
            environment = environment.name.as_str(),
            coordinate = %coordinate,
            "skipping Grail bucket: bucket support is disabled ({})",
            featureflags::BUCKETS.env_name()
        );
        return Some(ResolvedEntity::skipped(coordinate.clone()));
    }
    if !config.config_type.requires_oauth() {
        return None;
    }

    let missing_client = match (&config.config_type, clients) {
        (ConfigType::Automation { .. }, Some(set)) => set.automation.is_none(),
        (ConfigType::Bucket, Some(set)) => set.buckets.is_none(),
        _ => false,
    };
    if !environment.has_oauth() || missing_client {
        warn!(
            environment = environment.name.as_str(),
            group = environment.group.as_str(),
            coordinate = %coordinate,
            config_type = coordinate.config_type.as_str(),
            "skipping configuration: deploying this type requires OAuth credentials"
        );
        return Some(ResolvedEntity::skipped(coordinate.clone()));
    }
    None
}
